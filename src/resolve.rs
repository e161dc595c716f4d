//! Schema → `TypeMap` resolution.
//!
//! Three passes over one schema:
//! 1. index declarations and inline aliases, rejecting bad or duplicate names;
//! 2. resolve each declaration in schema order (objects and alias shapes are
//!    memoized, so each is built once);
//! 3. reject by-value embedding cycles in the finished map.
//!
//! Recursion through arrays and nullable wrappers is allowed. A union of
//! objects that includes an object still being built rebuilds that object on
//! the side, with the union itself standing in as its synthesized name.
pub(crate) mod union;

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use rayon::prelude::*;

use crate::config::{InlineUnionPolicy, MapperConfig};
use crate::error::SchemaError;
use crate::ir::{AliasDescriptor, Declaration, FieldDescriptor, ObjectDescriptor, Ty, TypeMap};
use crate::naming::{check_ident, pascal_case};
use crate::schema::{DeclarationSchema, ObjectSchema, Schema, SchemaNode};
use union::{Member, Shape};

// ------------------------------- Front API -------------------------------- //

#[derive(Debug, Clone, Default)]
pub struct TypeMapper {
    config: MapperConfig,
}

impl TypeMapper {
    pub fn new() -> Self { Self::default() }

    pub fn with_config(config: MapperConfig) -> Self { Self { config } }

    pub fn config(&self) -> &MapperConfig { &self.config }

    #[tracing::instrument(level = "debug", skip_all, fields(declarations = schema.declarations.len()))]
    pub fn resolve(&self, schema: &Schema) -> Result<TypeMap, SchemaError> {
        let mut resolver = Resolver::index(schema, &self.config)?;
        let decls = resolver.run(schema)?;
        check_embedding_cycles(&decls)?;
        tracing::debug!(emitted = decls.len(), "schema resolved");
        Ok(TypeMap { decls })
    }

    /// Resolve independent schemas in parallel; results keep input order.
    pub fn resolve_many(&self, schemas: &[Schema]) -> Vec<Result<TypeMap, SchemaError>> {
        schemas.par_iter().map(|s| self.resolve(s)).collect()
    }
}

/// Resolve with the default configuration.
pub fn resolve(schema: &Schema) -> Result<TypeMap, SchemaError> {
    TypeMapper::new().resolve(schema)
}

// ------------------------------ Resolver ---------------------------------- //

#[derive(Debug, Clone)]
struct ObjectEntry {
    fields: Vec<FieldDescriptor>,
    synthesized: Vec<ObjectDescriptor>,
}

#[derive(Debug, Clone)]
struct AliasEntry {
    shape: Shape,
    synthesized: Vec<ObjectDescriptor>,
}

/// Where a node sits: the name a synthesized object would take, plus a
/// human-readable location for errors.
struct Site<'a> {
    base: String,
    context: String,
    synthesized: &'a mut Vec<ObjectDescriptor>,
}

impl Site<'_> {
    fn element(&mut self) -> Site<'_> {
        Site {
            base: format!("{}Item", self.base),
            context: format!("{}[]", self.context),
            synthesized: &mut *self.synthesized,
        }
    }
}

struct Resolver<'s> {
    config: &'s MapperConfig,
    objects: HashMap<&'s str, &'s ObjectSchema>,
    aliases: HashMap<&'s str, &'s SchemaNode>,
    inline_aliases: Vec<&'s str>,
    /// Every name in use, including synthesized ones.
    claimed: HashSet<String>,
    object_cache: HashMap<String, ObjectEntry>,
    alias_cache: HashMap<String, AliasEntry>,
    /// Declarations whose resolution is in progress.
    stack: Vec<String>,
    /// Sites whose merged object is being computed. A union met again at one
    /// of these sites refers to the merged object by name.
    pending: Vec<String>,
    /// Nonzero while rebuilding an in-progress object for a merge. Such
    /// rebuilds are thrown away, so they claim no names.
    provisional: usize,
}

impl<'s> Resolver<'s> {
    fn index(schema: &'s Schema, config: &'s MapperConfig) -> Result<Self, SchemaError> {
        let mut r = Resolver {
            config,
            objects: HashMap::new(),
            aliases: HashMap::new(),
            inline_aliases: Vec::new(),
            claimed: HashSet::new(),
            object_cache: HashMap::new(),
            alias_cache: HashMap::new(),
            stack: Vec::new(),
            pending: Vec::new(),
            provisional: 0,
        };

        for decl in &schema.declarations {
            let name = decl.name();
            check_ident(name)?;
            if !r.claimed.insert(name.to_string()) {
                return Err(SchemaError::collision(name, "declared more than once"));
            }
            match decl {
                DeclarationSchema::Object(o) => { r.objects.insert(name, o); }
                DeclarationSchema::Alias { target, .. } => { r.aliases.insert(name, target); }
            }
        }

        for node in schema.nodes() {
            let SchemaNode::Alias { name, target } = node else { continue };
            check_ident(name)?;
            if r.objects.contains_key(name.as_str()) {
                return Err(SchemaError::collision(name, "inline alias shadows an object"));
            }
            match r.aliases.get(name.as_str()) {
                Some(existing) if *existing == target.as_ref() => {}
                Some(_) => {
                    return Err(SchemaError::collision(name, "alias redefined with a different target"));
                }
                None => {
                    r.aliases.insert(name.as_str(), target.as_ref());
                    r.inline_aliases.push(name.as_str());
                    r.claimed.insert(name.clone());
                }
            }
        }

        tracing::trace!(
            objects = r.objects.len(),
            aliases = r.aliases.len(),
            inline = r.inline_aliases.len(),
            "schema indexed"
        );
        Ok(r)
    }

    fn run(&mut self, schema: &'s Schema) -> Result<IndexMap<String, Declaration>, SchemaError> {
        let mut out: IndexMap<String, Declaration> = IndexMap::new();

        for decl in &schema.declarations {
            match decl {
                DeclarationSchema::Object(o) => {
                    self.resolve_object(&o.name)?;
                    let entry = &self.object_cache[&o.name];
                    out.insert(o.name.clone(), Declaration::Object(ObjectDescriptor {
                        name: o.name.clone(),
                        fields: entry.fields.clone(),
                    }));
                    push_synthesized(&mut out, &entry.synthesized);
                }
                DeclarationSchema::Alias { name, .. } => self.emit_alias(name, &mut out)?,
            }
        }
        for name in self.inline_aliases.clone() {
            self.emit_alias(name, &mut out)?;
        }
        Ok(out)
    }

    fn emit_alias(&mut self, name: &str, out: &mut IndexMap<String, Declaration>) -> Result<(), SchemaError> {
        let shape = self.alias_shape(name)?;
        match shape {
            Shape::Ty(target) => {
                out.insert(name.to_string(), Declaration::Alias(AliasDescriptor {
                    name: name.to_string(),
                    target,
                }));
            }
            Shape::Object { fields, nullable: false } => {
                out.insert(name.to_string(), Declaration::Object(ObjectDescriptor {
                    name: name.to_string(),
                    fields,
                }));
            }
            Shape::Object { fields, nullable: true } => {
                // a declaration cannot be nullable; split into object + nullable alias
                let object_name = format!("{name}Object");
                self.claim(&object_name)?;
                out.insert(object_name.clone(), Declaration::Object(ObjectDescriptor {
                    name: object_name.clone(),
                    fields,
                }));
                out.insert(name.to_string(), Declaration::Alias(AliasDescriptor {
                    name: name.to_string(),
                    target: Ty::nullable(Ty::Named(object_name)),
                }));
            }
        }
        push_synthesized(out, &self.alias_cache[name].synthesized);
        Ok(())
    }

    fn enter(&mut self, name: &str) -> Result<(), SchemaError> {
        if let Some(pos) = self.stack.iter().position(|n| n == name) {
            let mut path = self.stack[pos..].to_vec();
            path.push(name.to_string());
            return Err(SchemaError::CyclicReference { path });
        }
        self.stack.push(name.to_string());
        Ok(())
    }

    fn claim(&mut self, name: &str) -> Result<(), SchemaError> {
        if !self.claimed.insert(name.to_string()) {
            return Err(SchemaError::collision(name, "generated name clashes with an existing declaration"));
        }
        Ok(())
    }

    // ---- declarations ----

    fn resolve_object(&mut self, name: &str) -> Result<(), SchemaError> {
        if self.object_cache.contains_key(name) {
            return Ok(());
        }
        let object = self.objects[name];
        self.enter(name)?;
        let depth = std::mem::take(&mut self.provisional);
        let built = self.build_object(object);
        self.provisional = depth;
        self.stack.pop();
        let entry = built?;
        tracing::trace!(object = name, fields = entry.fields.len(), "object resolved");
        self.object_cache.insert(name.to_string(), entry);
        Ok(())
    }

    fn build_object(&mut self, object: &'s ObjectSchema) -> Result<ObjectEntry, SchemaError> {
        let mut fields = Vec::with_capacity(object.fields.len());
        let mut synthesized = Vec::new();
        let mut keys: HashSet<&str> = HashSet::new();
        let mut idents: HashSet<String> = HashSet::new();

        for f in &object.fields {
            let key = f.serialized_name();
            if !keys.insert(key) {
                return Err(SchemaError::collision(
                    key,
                    format!("serialized name used twice in `{}`", object.name),
                ));
            }
            let ident = pascal_case(&f.name);
            if !idents.insert(ident.clone()) {
                return Err(SchemaError::collision(
                    ident,
                    format!("two fields of `{}` map to the same identifier", object.name),
                ));
            }

            let mut site = Site {
                base: format!("{}{}", object.name, ident),
                context: format!("{}.{}", object.name, f.name),
                synthesized: &mut synthesized,
            };
            let ty = self.node_ty(&f.ty, &mut site)?;
            fields.push(FieldDescriptor {
                ident,
                serialized_name: key.to_string(),
                ty,
                optional: f.optional,
                omit_empty: self.config.omit_empty_optional,
            });
        }
        Ok(ObjectEntry { fields, synthesized })
    }

    fn alias_shape(&mut self, name: &str) -> Result<Shape, SchemaError> {
        if let Some(entry) = self.alias_cache.get(name) {
            return Ok(entry.shape.clone());
        }
        let target = self.aliases[name];
        self.enter(name)?;
        let mut synthesized = Vec::new();
        let mut site = Site {
            base: name.to_string(),
            context: format!("alias {name}"),
            synthesized: &mut synthesized,
        };
        let depth = std::mem::take(&mut self.provisional);
        let shape = self.alias_target_shape(target, &mut site);
        self.provisional = depth;
        self.stack.pop();
        let shape = shape?;
        self.alias_cache.insert(name.to_string(), AliasEntry { shape: shape.clone(), synthesized });
        Ok(shape)
    }

    /// Alias targets that name another alias resolve it first so that alias
    /// chains are checked for cycles.
    fn alias_target_shape(&mut self, target: &'s SchemaNode, site: &mut Site<'_>) -> Result<Shape, SchemaError> {
        if let SchemaNode::Reference { name } | SchemaNode::Alias { name, .. } = target {
            if self.aliases.contains_key(name.as_str()) {
                self.alias_shape(name)?;
            }
        }
        self.node_shape(target, site)
    }

    // ---- nodes ----

    fn node_ty(&mut self, node: &'s SchemaNode, site: &mut Site<'_>) -> Result<Ty, SchemaError> {
        let shape = self.node_shape(node, site)?;
        self.materialize(shape, site)
    }

    fn node_shape(&mut self, node: &'s SchemaNode, site: &mut Site<'_>) -> Result<Shape, SchemaError> {
        let ty = match node {
            SchemaNode::Scalar { scalar } => Ty::Scalar(*scalar),
            SchemaNode::Literal { value } => Ty::Scalar(value.base_kind()),
            SchemaNode::Null | SchemaNode::Dynamic => Ty::Dynamic,
            SchemaNode::Array { element } => Ty::array(self.node_ty(element, &mut site.element())?),
            SchemaNode::Reference { name } => self.reference(name, &site.context)?,
            SchemaNode::Alias { name, .. } => Ty::Named(name.clone()),
            SchemaNode::Union { members } => return self.collapse_union(members, site),
        };
        Ok(Shape::Ty(ty))
    }

    fn reference(&self, name: &str, context: &str) -> Result<Ty, SchemaError> {
        if self.objects.contains_key(name) || self.aliases.contains_key(name) {
            Ok(Ty::Named(name.to_string()))
        } else {
            Err(SchemaError::UnresolvedReference {
                name: name.to_string(),
                context: context.to_string(),
            })
        }
    }

    /// Bind a merged object to the current site.
    fn materialize(&mut self, shape: Shape, site: &mut Site<'_>) -> Result<Ty, SchemaError> {
        match shape {
            Shape::Ty(ty) => Ok(ty),
            Shape::Object { fields, nullable } => match self.config.inline_object_unions {
                InlineUnionPolicy::Dynamic => Ok(Ty::Dynamic),
                InlineUnionPolicy::Synthesize => {
                    let name = site.base.clone();
                    match site.synthesized.iter().find(|o| o.name == name) {
                        // identical members of one union share a site
                        Some(existing) if same_fields(&existing.fields, &fields) => {}
                        Some(_) => {
                            return Err(SchemaError::collision(
                                name,
                                format!("differing merged objects at {}", site.context),
                            ));
                        }
                        None => {
                            if self.provisional == 0 {
                                self.claim(&name)?;
                                tracing::debug!(object = %name, context = %site.context, "synthesized merged object");
                            }
                            site.synthesized.push(ObjectDescriptor { name: name.clone(), fields });
                        }
                    }
                    let ty = Ty::Named(name);
                    Ok(if nullable { Ty::nullable(ty) } else { ty })
                }
            },
        }
    }

    fn collapse_union(&mut self, members: &'s [SchemaNode], site: &mut Site<'_>) -> Result<Shape, SchemaError> {
        let mut raw = Vec::with_capacity(members.len());
        let mut had_null = false;
        flatten_union(members, &mut raw, &mut had_null);
        let wrap = |t: Ty| if had_null { Ty::nullable(t) } else { t };

        if self.pending.contains(&site.base) {
            return Ok(Shape::Ty(match self.config.inline_object_unions {
                InlineUnionPolicy::Synthesize => wrap(Ty::Named(site.base.clone())),
                InlineUnionPolicy::Dynamic => Ty::Dynamic,
            }));
        }
        // one name, maybe nullable: its shape is never needed
        if let [Raw::Name(name)] = raw.as_slice() {
            return Ok(Shape::Ty(wrap(self.reference(name, &site.context)?)));
        }

        let mark = site.synthesized.len();
        let mut resolved = Vec::with_capacity(raw.len());
        for r in raw {
            resolved.push(match r {
                Raw::Name(name) => self.named_member(name, &site.context)?,
                Raw::Node(node) => Member::Ty(self.node_ty(node, site)?),
            });
        }

        let distinct: HashSet<&str> = resolved.iter().filter_map(|m| match m {
            Member::Object { name, .. } => Some(name.as_str()),
            Member::Ty(_) => None,
        }).collect();
        if distinct.len() > 1 {
            self.pending.push(site.base.clone());
            let expanded = self.expand_objects(&mut resolved);
            self.pending.pop();
            expanded?;
        }

        let shape = union::collapse(resolved, had_null, self.config.union_policy, &site.context)?;
        self.drop_unreferenced(&shape, site, mark);
        Ok(shape)
    }

    fn expand_objects(&mut self, members: &mut [Member]) -> Result<(), SchemaError> {
        for m in members {
            if let Member::Object { name, fields: fields @ None, .. } = m {
                *fields = Some(self.object_fields(name)?);
            }
        }
        Ok(())
    }

    /// Fields of a union member object. An object that is still being built
    /// is rebuilt on the side; the union that led back to it resolves to the
    /// pending site name.
    fn object_fields(&mut self, name: &str) -> Result<Vec<FieldDescriptor>, SchemaError> {
        if !self.stack.iter().any(|n| n == name) {
            self.resolve_object(name)?;
            return Ok(self.object_cache[name].fields.clone());
        }
        tracing::trace!(object = name, "rebuilding object in progress for a merge");
        let object = self.objects[name];
        self.provisional += 1;
        let built = self.build_object(object);
        self.provisional -= 1;
        Ok(built?.fields)
    }

    /// Forget objects synthesized for union members that the collapsed
    /// union no longer refers to (e.g. it widened to dynamic).
    fn drop_unreferenced(&mut self, shape: &Shape, site: &mut Site<'_>, mark: usize) {
        if site.synthesized.len() == mark {
            return;
        }
        let mut used = HashSet::new();
        match shape {
            Shape::Ty(ty) => collect_named(ty, &mut used),
            Shape::Object { fields, .. } => fields.iter().for_each(|f| collect_named(&f.ty, &mut used)),
        }
        for obj in site.synthesized.split_off(mark) {
            if used.contains(obj.name.as_str()) {
                site.synthesized.push(obj);
                continue;
            }
            tracing::trace!(object = %obj.name, context = %site.context, "dropped unreferenced merged object");
            if self.provisional == 0 {
                self.claimed.remove(&obj.name);
            }
        }
    }

    /// Follow a name through alias chains to an object or a plain type.
    fn named_member(&mut self, name: &str, context: &str) -> Result<Member, SchemaError> {
        let mut current = name.to_string();
        let mut nullable = false;
        loop {
            if self.objects.contains_key(current.as_str()) {
                return Ok(Member::Object { name: current, fields: None, nullable });
            }
            if !self.aliases.contains_key(current.as_str()) {
                return Err(SchemaError::UnresolvedReference { name: current, context: context.to_string() });
            }
            // alias_shape already rejected cyclic chains
            match self.alias_shape(&current)? {
                Shape::Object { fields, nullable: n } => {
                    return Ok(Member::Object { name: current, fields: Some(fields), nullable: nullable || n });
                }
                Shape::Ty(Ty::Named(next)) => current = next,
                Shape::Ty(Ty::Nullable(inner)) if matches!(*inner, Ty::Named(_)) => {
                    nullable = true;
                    if let Ty::Named(next) = *inner {
                        current = next;
                    }
                }
                Shape::Ty(ty) => {
                    return Ok(Member::Ty(if nullable { Ty::nullable(ty) } else { ty }));
                }
            }
        }
    }
}

/// A union member before resolution. Names are expanded only when a merge
/// needs their fields.
#[derive(Clone, Copy, PartialEq)]
enum Raw<'s> {
    Name(&'s str),
    Node(&'s SchemaNode),
}

/// Flatten nested unions, dropping `null` and repeated members.
fn flatten_union<'s>(members: &'s [SchemaNode], out: &mut Vec<Raw<'s>>, had_null: &mut bool) {
    for m in members {
        let raw = match m {
            SchemaNode::Union { members } => {
                flatten_union(members, out, had_null);
                continue;
            }
            SchemaNode::Null => {
                *had_null = true;
                continue;
            }
            SchemaNode::Reference { name } | SchemaNode::Alias { name, .. } => Raw::Name(name.as_str()),
            other => Raw::Node(other),
        };
        if !out.contains(&raw) {
            out.push(raw);
        }
    }
}

fn collect_named<'a>(ty: &'a Ty, out: &mut HashSet<&'a str>) {
    match ty {
        Ty::Named(name) => {
            out.insert(name.as_str());
        }
        Ty::Array(inner) | Ty::Nullable(inner) => collect_named(inner, out),
        Ty::Scalar(_) | Ty::Dynamic => {}
    }
}

/// Same fields, in any order.
fn same_fields(a: &[FieldDescriptor], b: &[FieldDescriptor]) -> bool {
    a.len() == b.len() && b.iter().all(|f| a.contains(f))
}

fn push_synthesized(out: &mut IndexMap<String, Declaration>, synthesized: &[ObjectDescriptor]) {
    for obj in synthesized {
        out.insert(obj.name.clone(), Declaration::Object(obj.clone()));
    }
}

// ---------------------------- Cycle check --------------------------------- //

/// By-value edges: a field or alias target that is a bare `Named`. Arrays and
/// nullable wrappers are indirections and break cycles.
fn embedded_names(decl: &Declaration) -> Vec<&str> {
    match decl {
        Declaration::Object(o) => o.fields.iter().filter_map(|f| match &f.ty {
            Ty::Named(n) => Some(n.as_str()),
            _ => None,
        }).collect(),
        Declaration::Alias(a) => match &a.target {
            Ty::Named(n) => vec![n.as_str()],
            _ => Vec::new(),
        },
    }
}

fn check_embedding_cycles(decls: &IndexMap<String, Declaration>) -> Result<(), SchemaError> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark { Open, Done }

    fn visit<'a>(
        name: &'a str,
        decls: &'a IndexMap<String, Declaration>,
        marks: &mut HashMap<&'a str, Mark>,
        path: &mut Vec<&'a str>,
    ) -> Result<(), SchemaError> {
        match marks.get(name) {
            Some(Mark::Done) => return Ok(()),
            Some(Mark::Open) => {
                let start = path.iter().position(|n| *n == name).unwrap_or(0);
                let mut cycle: Vec<String> = path[start..].iter().map(|s| s.to_string()).collect();
                cycle.push(name.to_string());
                return Err(SchemaError::CyclicReference { path: cycle });
            }
            None => {}
        }
        let Some(decl) = decls.get(name) else { return Ok(()) };
        marks.insert(name, Mark::Open);
        path.push(name);
        for next in embedded_names(decl) {
            visit(next, decls, marks, path)?;
        }
        path.pop();
        marks.insert(name, Mark::Done);
        Ok(())
    }

    let mut marks = HashMap::new();
    let mut path = Vec::new();
    for name in decls.keys() {
        visit(name, decls, &mut marks, &mut path)?;
    }
    Ok(())
}

// ------------------------------- Tests ------------------------------------ //
