use super::*;

#[test]
fn compose_applies_right_operand_first() {
    let t = Affine3A::from_translation(Vec3::new(1.0, 0.0, 0.0));
    let s = Affine3A::from_scale(Vec3::splat(2.0));
    let p = compose(t, s).transform_point3(Vec3::new(1.0, 1.0, 1.0));
    assert_eq!(p, Vec3::new(3.0, 2.0, 2.0));
}

#[test]
fn bounding_box_min_max_and_size() {
    let b = BoundingBox::new(Vec3::new(1.0, 2.0, 3.0), Vec3::new(4.0, 5.0, 0.0));
    assert_eq!(b.min(), Vec3::new(1.0, 2.0, 3.0));
    assert_eq!(b.max(), Vec3::new(5.0, 7.0, 3.0));
    assert_eq!(b.size(), Vec3::new(4.0, 5.0, 0.0));
}

#[test]
fn transformed_box_follows_translation() {
    let b = BoundingBox::new(Vec3::ZERO, Vec3::ONE);
    let moved = b.transformed(&Affine3A::from_translation(Vec3::new(1.0, 2.0, 0.0)));
    assert_eq!(moved.min(), Vec3::new(1.0, 2.0, 0.0));
    assert_eq!(moved.max(), Vec3::new(2.0, 3.0, 1.0));
}

#[test]
fn union_encloses_both() {
    let a = BoundingBox::new(Vec3::ZERO, Vec3::ONE);
    let b = BoundingBox::new(Vec3::new(-1.0, 0.5, 0.0), Vec3::new(1.0, 2.0, 1.0));
    let u = a.union(&b);
    assert_eq!(u.min(), Vec3::new(-1.0, 0.0, 0.0));
    assert_eq!(u.max(), Vec3::new(1.0, 2.5, 1.0));
}
