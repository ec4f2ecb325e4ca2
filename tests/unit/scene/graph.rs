use super::*;
use crate::foundation::core::Vec3;

fn id(n: u32) -> DataId {
    DataId(n)
}

fn assert_close(a: Affine3A, b: Affine3A) {
    assert!(a.abs_diff_eq(b, 1e-6), "{a:?} != {b:?}");
}

#[test]
fn first_reference_creates_identity_root() {
    let mut g = SceneGraph::new();
    let n = *g.get_data_node(id(3));
    assert_eq!(n.owner, id(3));
    assert_eq!(n.parent, None);
    assert_eq!(n.local, Affine3A::IDENTITY);
    assert_eq!(g.len(), 1);
}

#[test]
fn unknown_data_is_identity() {
    let g = SceneGraph::new();
    assert_eq!(g.linear_transformation(id(9)), Affine3A::IDENTITY);
}

#[test]
fn world_transform_composes_root_to_leaf() {
    let mut g = SceneGraph::new();
    g.set_local_transform(id(0), Affine3A::IDENTITY);
    g.set_local_transform(id(1), Affine3A::from_translation(Vec3::new(1.0, 0.0, 0.0)));
    g.set_local_transform(id(2), Affine3A::from_translation(Vec3::new(0.0, 2.0, 0.0)));
    g.set_parent(id(1), Some(id(0))).unwrap();
    g.set_parent(id(2), Some(id(1))).unwrap();

    assert_close(
        g.linear_transformation(id(2)),
        Affine3A::from_translation(Vec3::new(1.0, 2.0, 0.0)),
    );
}

#[test]
fn parent_applies_after_child() {
    let mut g = SceneGraph::new();
    let scale = Affine3A::from_scale(Vec3::splat(2.0));
    let shift = Affine3A::from_translation(Vec3::new(1.0, 0.0, 0.0));
    g.set_local_transform(id(0), scale);
    g.set_local_transform(id(1), shift);
    g.set_parent(id(1), Some(id(0))).unwrap();

    let p = g
        .linear_transformation(id(1))
        .transform_point3(Vec3::ZERO);
    assert!((p - Vec3::new(2.0, 0.0, 0.0)).length() < 1e-6);
}

#[test]
fn cycles_are_rejected() {
    let mut g = SceneGraph::new();
    assert!(matches!(
        g.set_parent(id(0), Some(id(0))),
        Err(MedflowError::InvalidConfiguration(_))
    ));
    g.set_parent(id(1), Some(id(0))).unwrap();
    g.set_parent(id(2), Some(id(1))).unwrap();
    assert!(matches!(
        g.set_parent(id(0), Some(id(2))),
        Err(MedflowError::InvalidConfiguration(_))
    ));
    assert_eq!(g.node(id(0)).unwrap().parent, None);
}

#[test]
fn removing_a_parent_orphans_children() {
    let mut g = SceneGraph::new();
    g.set_local_transform(id(0), Affine3A::from_translation(Vec3::X));
    g.set_parent(id(1), Some(id(0))).unwrap();
    assert!(g.remove(id(0)).is_some());
    assert!(!g.contains(id(0)));
    assert_eq!(g.node(id(1)).unwrap().parent, None);
    assert_eq!(g.linear_transformation(id(1)), Affine3A::IDENTITY);
}
