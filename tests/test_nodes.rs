// Flat parameter addressing through nested composites.

use ferrite_conv::node::{AffineNode, Aggregate, Join, Sequence};
use ferrite_conv::{
    ActivationFunction, ComputationNode, Dense, Layer, NetError, Network, Result, Shape, Tensor,
};

fn affine(inputs: usize, outputs: usize) -> AffineNode {
    AffineNode::new(inputs, outputs, ActivationFunction::Identity).unwrap()
}

fn concat(parts: Vec<Tensor>) -> Result<Tensor> {
    Ok(Tensor::from(parts.into_iter().flat_map(Tensor::into_vec).collect::<Vec<f64>>()))
}

fn numbered(n: usize) -> Vec<f64> {
    (0..n).map(|i| i as f64 + 1.0).collect()
}

#[test]
fn sequence_orders_first_then_second() {
    let mut seq = Sequence::new(affine(2, 2), affine(2, 1));
    assert_eq!(seq.param_count(), 6 + 3);

    let values = numbered(9);
    let mut cursor = 0;
    seq.update_params(&values, false, &mut cursor).unwrap();
    assert_eq!(cursor, 9);
    assert_eq!(seq.params(), values);
    assert_eq!(seq.first().params(), values[..6].to_vec());
    assert_eq!(seq.second().get_param(0), Some(7.0));

    // first: [1 2; 3 4]·[1, 1] + [5, 6] = [8, 13]; second: 7·8 + 8·13 + 9
    let out = seq.calculate(&Tensor::from(vec![1.0, 1.0])).unwrap();
    assert_eq!(out.as_slice(), &[7.0 * 8.0 + 8.0 * 13.0 + 9.0]);
}

#[test]
fn aggregate_addresses_children_in_supply_order() {
    let children = vec![affine(3, 1), affine(3, 2), affine(3, 1)];
    let mut agg = Aggregate::new(children, concat).unwrap();
    assert_eq!(agg.param_count(), 4 + 8 + 4);

    assert!(agg.set_param(4, 10.0, false));
    assert_eq!(agg.children()[1].get_param(0), Some(10.0));
    assert!(agg.set_param(15, -1.0, false));
    assert_eq!(agg.children()[2].get_param(3), Some(-1.0));
    assert!(agg.set_param(15, 0.5, true));
    assert_eq!(agg.get_param(15), Some(-0.5));

    assert!(!agg.set_param(16, 1.0, false));
    assert_eq!(agg.get_param(16), None);

    let out = agg.calculate(&Tensor::from(vec![1.0, 0.0, 0.0])).unwrap();
    assert_eq!(out.shape(), Shape::vector(4));
}

#[test]
fn join_of_network_and_leaf() {
    let mut net = Network::new(Shape::vector(2));
    net.add_layer(Layer::Dense(
        Dense::new(Shape::vector(2), 2, Some(ActivationFunction::Identity)).unwrap(),
    ))
    .unwrap();
    net.build().unwrap();

    let mut join = Join::new(net, affine(2, 1), |a: Tensor, b: Tensor| concat(vec![a, b]));
    assert_eq!(join.param_count(), 6 + 3);

    let values = numbered(9);
    let mut cursor = 0;
    join.update_params(&values, false, &mut cursor).unwrap();
    assert_eq!(join.left().weights(), &values[..6]);
    assert_eq!(join.right().params(), values[6..].to_vec());

    // deltas add on top
    let mut cursor = 0;
    join.update_params(&vec![1.0; 9], true, &mut cursor).unwrap();
    assert_eq!(join.params(), numbered(9).iter().map(|v| v + 1.0).collect::<Vec<_>>());

    let out = join.calculate(&Tensor::from(vec![1.0, 1.0])).unwrap();
    // network: [2 3; 4 5]·1 + [6 7] = [11, 16]; leaf: 8 + 9 + 10 = 27
    assert_eq!(out.as_slice(), &[11.0, 16.0, 27.0]);
}

#[test]
fn nested_composites_share_one_index_space() {
    let inner = Sequence::new(affine(2, 2), affine(2, 2));
    let other = Sequence::new(affine(2, 1), affine(1, 2));
    let mut outer = Aggregate::new(vec![inner, other], concat).unwrap();
    let total = outer.param_count();
    assert_eq!(total, (6 + 6) + (3 + 4));

    let values = numbered(total);
    let mut cursor = 0;
    outer.update_params(&values, false, &mut cursor).unwrap();
    for (i, v) in values.iter().enumerate() {
        assert_eq!(outer.get_param(i), Some(*v));
    }
    assert_eq!(outer.children()[1].second().get_param(0), Some(16.0));
}

#[test]
fn update_params_continues_from_cursor() {
    let mut a = affine(1, 1);
    let mut b = affine(1, 1);
    let values = [1.0, 2.0, 3.0, 4.0];
    let mut cursor = 0;
    a.update_params(&values, false, &mut cursor).unwrap();
    b.update_params(&values, false, &mut cursor).unwrap();
    assert_eq!(cursor, 4);
    assert_eq!(a.params(), vec![1.0, 2.0]);
    assert_eq!(b.params(), vec![3.0, 4.0]);
}

#[test]
fn short_input_fails_without_side_effects() {
    let mut seq = Sequence::new(affine(2, 2), affine(2, 1));
    let before = seq.params();
    let mut cursor = 2;
    let err = seq.update_params(&numbered(10), false, &mut cursor).unwrap_err();
    assert!(matches!(
        err,
        NetError::ParamCountMismatch { expected: 9, offset: 2, available: 8 }
    ));
    assert_eq!(cursor, 2);
    assert_eq!(seq.params(), before);
}

#[test]
fn network_rejects_updates_before_build() {
    let mut net = Network::new(Shape::vector(1));
    net.add_layer(Layer::Dense(
        Dense::new(Shape::vector(1), 1, Some(ActivationFunction::Identity)).unwrap(),
    ))
    .unwrap();
    let mut cursor = 0;
    assert!(matches!(
        net.update_params(&[1.0, 2.0], false, &mut cursor),
        Err(NetError::NotBuilt)
    ));
    assert!(matches!(net.calculate(&Tensor::from(vec![1.0])), Err(NetError::NotBuilt)));
}
