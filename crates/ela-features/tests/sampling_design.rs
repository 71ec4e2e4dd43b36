use ela_core::{Bounds, RngHandle};
use ela_features::sampling::{
    clip_to_bounds, create_initial_sample, levy_random_walk_step, random_vertex, SampleMethod,
    SampleSize,
};

#[test]
fn latin_hypercube_fills_requested_rows_inside_bounds() {
    let bounds = Bounds::normalize(5, -5.0, 5.0).expect("bounds");
    let mut rng = RngHandle::from_seed(42);
    let points = create_initial_sample(
        &bounds,
        SampleSize::Coefficient(50),
        SampleMethod::LatinHypercube,
        &mut rng,
    )
    .expect("sample");
    assert_eq!(points.len(), 250);
    assert!(points.iter().all(|p| bounds.contains(p)));
}

#[test]
fn quasi_random_design_is_reproducible() {
    let bounds = Bounds::normalize(3, vec![0.0, -1.0, 10.0], vec![1.0, 1.0, 20.0]).expect("bounds");
    let draw = |seed| {
        let mut rng = RngHandle::from_seed(seed);
        create_initial_sample(&bounds, SampleSize::Count(64), SampleMethod::QuasiRandom, &mut rng)
            .expect("sample")
    };
    let first = draw(9);
    assert_eq!(first, draw(9));
    assert_ne!(first, draw(10));
    assert!(first.iter().all(|p| bounds.contains(p)));
}

#[test]
fn empty_sample_request_is_rejected() {
    let bounds = Bounds::normalize(2, 0.0, 1.0).expect("bounds");
    let mut rng = RngHandle::from_seed(1);
    let err = create_initial_sample(&bounds, SampleSize::Count(0), SampleMethod::default(), &mut rng)
        .unwrap_err();
    assert_eq!(err.info().code, "sample_size");
}

#[test]
fn clipped_levy_walk_never_leaves_the_box() {
    let bounds = Bounds::normalize(3, -1.0, 1.0).expect("bounds");
    let mut rng = RngHandle::from_seed(3);
    let (mut x, _) = random_vertex(&bounds, &mut rng);
    for _ in 0..500 {
        x = clip_to_bounds(&levy_random_walk_step(&x, &mut rng), &bounds);
        assert!(bounds.contains(&x));
    }
}

#[test]
fn random_vertex_reports_upper_coordinates() {
    let bounds = Bounds::normalize(6, -2.0, 3.0).expect("bounds");
    let mut rng = RngHandle::from_seed(5);
    let (vertex, at_upper) = random_vertex(&bounds, &mut rng);
    for (x, upper) in vertex.iter().zip(at_upper) {
        assert_eq!(*x, if upper { 3.0 } else { -2.0 });
    }
}
