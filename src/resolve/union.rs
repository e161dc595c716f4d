//! Union collapse and object merging.
//!
//! Members arrive already resolved: scalars/arrays/names as `Ty`, object
//! references with their field lists filled in once a merge needs them. Collapse is order-independent
//! except for merged field order, which follows first appearance.
use indexmap::IndexMap;
use indexmap::map::Entry;

use crate::config::UnionPolicy;
use crate::error::SchemaError;
use crate::ir::{FieldDescriptor, Ty};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Member {
    Ty(Ty),
    /// `fields` stays `None` until a merge of distinct objects needs it.
    Object { name: String, fields: Option<Vec<FieldDescriptor>>, nullable: bool },
}

/// Result of resolving a node before it is bound to a declaration site.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Shape {
    Ty(Ty),
    /// Merged object that still needs a name.
    Object { fields: Vec<FieldDescriptor>, nullable: bool },
}

/// Least common type of two resolved types, if one exists.
pub(crate) fn unify(a: &Ty, b: &Ty) -> Option<Ty> {
    if a == b {
        return Some(a.clone());
    }
    match (a, b) {
        (Ty::Dynamic, _) | (_, Ty::Dynamic) => Some(Ty::Dynamic),
        (Ty::Scalar(x), Ty::Scalar(y)) if x.family() == y.family() => {
            Some(Ty::Scalar(x.family().base_kind()))
        }
        (Ty::Nullable(x), y) | (y, Ty::Nullable(x)) => unify(x, y).map(Ty::nullable),
        _ => None,
    }
}

fn incompatible(policy: UnionPolicy, context: &str, detail: String) -> Result<Shape, SchemaError> {
    match policy {
        UnionPolicy::Open => {
            tracing::debug!(context, %detail, "union widened to dynamic");
            Ok(Shape::Ty(Ty::Dynamic))
        }
        UnionPolicy::Strict => Err(SchemaError::IncompatibleUnion {
            context: context.to_string(),
            detail,
        }),
    }
}

pub(crate) fn collapse(
    members: Vec<Member>,
    mut had_null: bool,
    policy: UnionPolicy,
    context: &str,
) -> Result<Shape, SchemaError> {
    let mut objects: Vec<(String, Vec<FieldDescriptor>)> = Vec::new();
    let mut tys: Vec<Ty> = Vec::new();

    for m in members {
        match m {
            Member::Object { name, fields, nullable } => {
                had_null |= nullable;
                if !objects.iter().any(|(n, _)| *n == name) {
                    objects.push((name, fields.unwrap_or_default()));
                }
            }
            Member::Ty(Ty::Nullable(inner)) => {
                had_null = true;
                tys.push(*inner);
            }
            Member::Ty(t) => tys.push(t),
        }
    }

    let wrap = |t: Ty| if had_null { Ty::nullable(t) } else { t };

    if objects.is_empty() && tys.is_empty() {
        if had_null {
            return Ok(Shape::Ty(Ty::Dynamic));
        }
        return Err(SchemaError::IncompatibleUnion {
            context: context.to_string(),
            detail: "union has no members".to_string(),
        });
    }

    if tys.iter().any(Ty::is_dynamic) {
        return Ok(Shape::Ty(Ty::Dynamic));
    }

    if !objects.is_empty() {
        if !tys.is_empty() {
            return incompatible(policy, context, "objects mixed with non-object members".to_string());
        }
        if objects.len() == 1 {
            let (name, _) = objects.remove(0);
            return Ok(Shape::Ty(wrap(Ty::Named(name))));
        }
        let fields = merge_objects(objects, policy, context)?;
        return Ok(Shape::Object { fields, nullable: had_null });
    }

    let mut acc = tys.remove(0);
    for t in &tys {
        match unify(&acc, t) {
            Some(u) => acc = u,
            None => {
                return incompatible(policy, context, format!("{acc:?} and {t:?} do not collapse"));
            }
        }
    }
    Ok(Shape::Ty(wrap(acc)))
}

/// Merge member objects field-by-field, keyed on serialized name.
/// A field missing from any member becomes optional.
pub(crate) fn merge_objects(
    objects: Vec<(String, Vec<FieldDescriptor>)>,
    policy: UnionPolicy,
    context: &str,
) -> Result<Vec<FieldDescriptor>, SchemaError> {
    let total = objects.len();
    let mut merged: IndexMap<String, (FieldDescriptor, usize)> = IndexMap::new();

    for (member, fields) in objects {
        for f in fields {
            match merged.entry(f.serialized_name.clone()) {
                Entry::Vacant(slot) => {
                    slot.insert((f, 1));
                }
                Entry::Occupied(mut slot) => {
                    let (existing, seen_in) = slot.get_mut();
                    existing.ty = match unify(&existing.ty, &f.ty) {
                        Some(t) => t,
                        None => match policy {
                            UnionPolicy::Open => Ty::Dynamic,
                            UnionPolicy::Strict => {
                                return Err(SchemaError::IncompatibleUnion {
                                    context: context.to_string(),
                                    detail: format!(
                                        "field `{}` of `{member}` is {:?}, previously {:?}",
                                        f.serialized_name, f.ty, existing.ty
                                    ),
                                });
                            }
                        },
                    };
                    existing.optional |= f.optional;
                    *seen_in += 1;
                }
            }
        }
    }

    let mut idents: Vec<&str> = Vec::with_capacity(merged.len());
    for (f, _) in merged.values() {
        if idents.contains(&f.ident.as_str()) {
            return Err(SchemaError::collision(
                f.ident.clone(),
                format!("two merged fields map to the same identifier in {context}"),
            ));
        }
        idents.push(&f.ident);
    }

    Ok(merged
        .into_values()
        .map(|(mut f, seen_in)| {
            if seen_in < total {
                f.optional = true;
            }
            f
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ScalarKind;

    fn s(kind: ScalarKind) -> Ty { Ty::Scalar(kind) }

    fn field(name: &str, ty: Ty, optional: bool) -> FieldDescriptor {
        FieldDescriptor {
            ident: crate::naming::pascal_case(name),
            serialized_name: name.to_string(),
            ty,
            optional,
            omit_empty: true,
        }
    }

    fn obj(name: &str, fields: Vec<FieldDescriptor>) -> Member {
        Member::Object { name: name.to_string(), fields: Some(fields), nullable: false }
    }

    #[test]
    fn unify_scalars_by_family() {
        assert_eq!(unify(&s(ScalarKind::Int), &s(ScalarKind::Int)), Some(s(ScalarKind::Int)));
        assert_eq!(unify(&s(ScalarKind::Int16), &s(ScalarKind::Number)), Some(s(ScalarKind::Number)));
        assert_eq!(unify(&s(ScalarKind::String), &s(ScalarKind::Byte)), None);
        assert_eq!(
            unify(&Ty::nullable(s(ScalarKind::String)), &s(ScalarKind::String)),
            Some(Ty::nullable(s(ScalarKind::String)))
        );
        assert_eq!(unify(&Ty::array(s(ScalarKind::Int)), &Ty::array(s(ScalarKind::Int8))), None);
    }

    #[test]
    fn union_law_commutative_on_scalars() {
        let a = vec![Member::Ty(s(ScalarKind::Int)), Member::Ty(s(ScalarKind::Rune))];
        let b = vec![Member::Ty(s(ScalarKind::Rune)), Member::Ty(s(ScalarKind::Int))];
        let ra = collapse(a, false, UnionPolicy::Open, "t").unwrap();
        let rb = collapse(b, false, UnionPolicy::Open, "t").unwrap();
        assert_eq!(ra, rb);
        assert_eq!(ra, Shape::Ty(s(ScalarKind::Number)));
    }

    #[test]
    fn null_members_wrap_nullable() {
        let r = collapse(vec![Member::Ty(s(ScalarKind::String))], true, UnionPolicy::Open, "t").unwrap();
        assert_eq!(r, Shape::Ty(Ty::nullable(s(ScalarKind::String))));
        let only_null = collapse(vec![], true, UnionPolicy::Strict, "t").unwrap();
        assert_eq!(only_null, Shape::Ty(Ty::Dynamic));
    }

    #[test]
    fn empty_union_fails_under_any_policy() {
        let e = collapse(vec![], false, UnionPolicy::Open, "t").unwrap_err();
        assert_eq!(e.kind(), crate::error::SchemaErrorKind::IncompatibleUnion);
    }

    #[test]
    fn strict_policy_rejects_mixed_families() {
        let members = vec![Member::Ty(s(ScalarKind::String)), Member::Ty(s(ScalarKind::Number))];
        assert_eq!(
            collapse(members.clone(), false, UnionPolicy::Open, "t").unwrap(),
            Shape::Ty(Ty::Dynamic)
        );
        assert!(collapse(members, false, UnionPolicy::Strict, "t").is_err());
    }

    #[test]
    fn dynamic_member_absorbs_everything() {
        let members = vec![Member::Ty(Ty::Dynamic), obj("A", vec![])];
        assert_eq!(collapse(members, false, UnionPolicy::Strict, "t").unwrap(), Shape::Ty(Ty::Dynamic));
    }

    #[test]
    fn same_object_twice_is_a_reference() {
        let members = vec![obj("A", vec![]), obj("A", vec![])];
        assert_eq!(
            collapse(members, false, UnionPolicy::Strict, "t").unwrap(),
            Shape::Ty(Ty::named("A"))
        );
    }

    #[test]
    fn merge_marks_missing_fields_optional_and_keeps_first_seen_order() {
        let a = vec![field("type", s(ScalarKind::String), false), field("dude", s(ScalarKind::String), false)];
        let b = vec![field("type", s(ScalarKind::String), false), field("other_dude", s(ScalarKind::String), false)];
        let merged = merge_objects(vec![("A".into(), a), ("B".into(), b)], UnionPolicy::Open, "t").unwrap();
        let names: Vec<_> = merged.iter().map(|f| (f.serialized_name.as_str(), f.optional)).collect();
        assert_eq!(names, vec![("type", false), ("dude", true), ("other_dude", true)]);
    }

    #[test]
    fn merge_conflicting_field_types() {
        let a = vec![field("test", s(ScalarKind::String), false)];
        let b = vec![field("test", Ty::named("Scalars"), false)];
        let open = merge_objects(vec![("A".into(), a.clone()), ("B".into(), b.clone())], UnionPolicy::Open, "t").unwrap();
        assert_eq!(open[0].ty, Ty::Dynamic);
        assert!(!open[0].optional);
        let strict = merge_objects(vec![("A".into(), a), ("B".into(), b)], UnionPolicy::Strict, "t");
        assert!(strict.is_err());
    }

    #[test]
    fn merge_detects_identifier_clash() {
        let a = vec![field("other_dude", s(ScalarKind::String), false)];
        let b = vec![field("otherDude", s(ScalarKind::String), false)];
        let e = merge_objects(vec![("A".into(), a), ("B".into(), b)], UnionPolicy::Open, "t").unwrap_err();
        assert_eq!(e.kind(), crate::error::SchemaErrorKind::NamingCollision);
    }
}
