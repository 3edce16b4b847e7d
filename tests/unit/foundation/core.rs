use super::*;

#[test]
fn borders_sums_and_zero() {
    let b = Borders {
        left: 1.0,
        top: 2.0,
        right: 3.0,
        bottom: 4.0,
    };
    assert_eq!(b.horizontal(), 4.0);
    assert_eq!(b.vertical(), 6.0);
    assert!(!b.is_zero());
    assert!(Borders::default().is_zero());
    assert_eq!(Borders::uniform(2.0).horizontal(), 4.0);
}

#[test]
fn borders_scaled_scales_every_side() {
    let b = Borders {
        left: 2.0,
        top: 4.0,
        right: 6.0,
        bottom: 8.0,
    }
    .scaled(0.5);
    assert_eq!(
        b,
        Borders {
            left: 1.0,
            top: 2.0,
            right: 3.0,
            bottom: 4.0,
        }
    );
}

#[test]
fn channel_weights_dot_is_unnormalized() {
    let c = [0.5, 0.25, 1.0, 0.8];
    assert_eq!(ChannelWeights::ALPHA.dot(c), 0.8);
    assert_eq!(ChannelWeights::RED.dot(c), 0.5);
    assert_eq!(ChannelWeights::GREEN.dot(c), 0.25);
    assert_eq!(ChannelWeights::BLUE.dot(c), 1.0);

    let gray = ChannelWeights::GRAY.dot([1.0, 1.0, 1.0, 0.0]);
    assert!((gray - 1.0).abs() < 1e-6);

    // Weights summing above one are accepted by design.
    let hot = ChannelWeights::new(1.0, 1.0, 1.0, 1.0).dot([1.0, 1.0, 1.0, 1.0]);
    assert_eq!(hot, 4.0);
}

#[test]
fn default_weights_are_alpha() {
    assert_eq!(ChannelWeights::default(), ChannelWeights::ALPHA);
}
