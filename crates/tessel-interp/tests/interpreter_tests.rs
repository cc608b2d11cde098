//! End-to-end tests driving the interpreter one instruction at a time.

use tessel_core::{promote, reduced_axes, Array, Buffer, DType, Scalar, Shape, TesselError};
use tessel_interp::{
    BinaryOp, BufferOp, ExecError, Interpreter, InterpreterConfig, MovementOp, Op, OpArg, ReduceOp,
    TernaryOp, UnaryOp, Value,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn interp() -> Interpreter {
    init_tracing();
    Interpreter::new(InterpreterConfig::default().with_check_views(true))
}

fn assert_close(a: &[f32], b: &[f32], tol: f32) {
    assert_eq!(a.len(), b.len(), "length mismatch: {} vs {}", a.len(), b.len());
    for (i, (x, y)) in a.iter().zip(b.iter()).enumerate() {
        assert!(
            (x - y).abs() < tol,
            "element {} differs: {} vs {} (tol={})",
            i, x, y, tol
        );
    }
}

fn arr<T: tessel_core::Element>(data: Vec<T>, shape: &[usize]) -> Value {
    Array::from_vec(data, shape).unwrap().into()
}

fn run(interp: &Interpreter, op: impl Into<Op>, operands: &[Value], arg: &OpArg) -> Array {
    interp
        .execute(op, operands, arg)
        .unwrap()
        .into_array()
        .expect("instruction should produce an array")
}

// ============================================================================
// Buffer ops
// ============================================================================

#[test]
fn test_const() {
    let interp = interp();
    let c = run(&interp, BufferOp::Const, &[], &OpArg::constant(2.5, DType::F32));
    assert!(c.shape().is_scalar());
    assert_eq!(c.to_vec::<f32>().unwrap(), vec![2.5]);
}

#[test]
fn test_uninitialized_buffer_reads_zero() {
    let interp = interp();
    let buf = Value::from(Buffer::new(3, DType::I16));
    let a = run(&interp, BufferOp::Mem, &[buf], &OpArg::None);
    assert_eq!(a.shape().dims(), &[3]);
    assert_eq!(a.to_vec::<i16>().unwrap(), vec![0, 0, 0]);
}

#[test]
fn test_from_underlying_then_mem() {
    let interp = interp();
    let a = Array::from_vec(vec![1u32, 2, 3, 4], [2, 2]).unwrap();
    let t = a.permute(&[1, 0]).unwrap();
    let buf = interp
        .execute(BufferOp::FromUnderlying, &[t.into()], &OpArg::None)
        .unwrap();
    assert_eq!(buf.as_buffer().unwrap().numel(), 4);
    let flat = run(&interp, BufferOp::Mem, &[buf], &OpArg::None);
    assert_eq!(flat.to_vec::<u32>().unwrap(), vec![1, 3, 2, 4]);
}

// ============================================================================
// Unary ops
// ============================================================================

#[test]
fn test_transcendentals() {
    let interp = interp();
    let x = arr(vec![0.0f32, 1.0, 4.0], &[3]);
    let e = run(&interp, UnaryOp::Exp2, &[x.clone()], &OpArg::None);
    assert_close(&e.to_vec::<f32>().unwrap(), &[1.0, 2.0, 16.0], 1e-5);
    let s = run(&interp, UnaryOp::Sqrt, &[x.clone()], &OpArg::None);
    assert_close(&s.to_vec::<f32>().unwrap(), &[0.0, 1.0, 2.0], 1e-6);
    let l = run(&interp, UnaryOp::Log2, &[arr(vec![8.0f32], &[1])], &OpArg::None);
    assert_close(&l.to_vec::<f32>().unwrap(), &[3.0], 1e-6);
    let sin = run(&interp, UnaryOp::Sin, &[x], &OpArg::None);
    assert_close(&sin.to_vec::<f32>().unwrap(), &[0.0, 1.0f32.sin(), 4.0f32.sin()], 1e-6);
}

#[test]
fn test_neg_bool_is_logical_not() {
    let interp = interp();
    let r = run(&interp, UnaryOp::Neg, &[arr(vec![true, false], &[2])], &OpArg::None);
    assert_eq!(r.dtype(), DType::Bool);
    assert_eq!(r.to_vec::<bool>().unwrap(), vec![false, true]);
}

#[test]
fn test_noop_makes_contiguous() {
    let interp = interp();
    let a = Array::from_vec(vec![1i8, 2, 3, 4, 5, 6], [2, 3]).unwrap();
    let t = a.permute(&[1, 0]).unwrap();
    let r = run(&interp, UnaryOp::Noop, &[t.into()], &OpArg::None);
    assert!(r.is_contiguous());
    assert_eq!(r.as_slice::<i8>().unwrap(), &[1, 4, 2, 5, 3, 6]);
}

#[test]
fn test_cast_and_bitcast() {
    let interp = interp();
    let x = arr(vec![1.0f32, -2.75], &[2]);
    let c = run(&interp, UnaryOp::Cast, &[x.clone()], &OpArg::cast(DType::I64));
    assert_eq!(c.to_vec::<i64>().unwrap(), vec![1, -2]);

    let bits = run(&interp, UnaryOp::Cast, &[x.clone()], &OpArg::bitcast(DType::I32));
    assert_eq!(bits.to_vec::<i32>().unwrap()[0], 0x3f80_0000);

    let err = interp
        .execute(UnaryOp::Cast, &[x], &OpArg::bitcast(DType::F16))
        .unwrap_err();
    assert!(matches!(err, ExecError::Core(TesselError::CastFailure { .. })));
}

// ============================================================================
// Binary ops
// ============================================================================

#[test]
fn test_div_then_cast_truncates() {
    let interp = interp();
    let q = run(
        &interp,
        BinaryOp::Div,
        &[arr(vec![-7i32], &[1]), arr(vec![2i32], &[1])],
        &OpArg::None,
    );
    assert_eq!(q.dtype(), DType::I32);
    let f = run(&interp, UnaryOp::Cast, &[q.into()], &OpArg::cast(DType::F32));
    assert_eq!(f.to_vec::<f32>().unwrap(), vec![-3.0]);
}

#[test]
fn test_cmplt_returns_promoted_numeric() {
    let interp = interp();
    let r = run(
        &interp,
        BinaryOp::CmpLt,
        &[arr(vec![1u8, 9], &[2]), arr(vec![5i16, 5], &[2])],
        &OpArg::None,
    );
    assert_eq!(r.dtype(), DType::I16);
    assert_eq!(r.to_vec::<i16>().unwrap(), vec![1, 0]);
}

#[test]
fn test_cmplt_compares_before_promotion() {
    let interp = interp();
    let r = run(&interp, BinaryOp::CmpLt, &[arr(vec![-1i8], &[1]), arr(vec![1u8], &[1])], &OpArg::None);
    assert_eq!(r.dtype(), DType::U8);
    assert_eq!(r.to_vec::<u8>().unwrap(), vec![1]);

    let r = run(&interp, BinaryOp::CmpLt, &[arr(vec![-1i64], &[1]), arr(vec![5u64], &[1])], &OpArg::None);
    assert_eq!(r.dtype(), DType::U64);
    assert_eq!(r.to_vec::<u64>().unwrap(), vec![1]);

    let r = run(&interp, BinaryOp::CmpLt, &[arr(vec![5u64], &[1]), arr(vec![-1i64], &[1])], &OpArg::None);
    assert_eq!(r.to_vec::<u64>().unwrap(), vec![0]);
}

#[test]
fn test_binary_broadcast_and_promotion() {
    let interp = interp();
    let r = run(
        &interp,
        BinaryOp::Sub,
        &[arr(vec![10i32, 20, 30, 40], &[2, 2]), arr(vec![1.5f64, 2.5], &[2])],
        &OpArg::None,
    );
    assert_eq!(r.dtype(), DType::F64);
    assert_eq!(r.to_vec::<f64>().unwrap(), vec![8.5, 17.5, 28.5, 37.5]);

    let m = run(
        &interp,
        BinaryOp::Max,
        &[arr(vec![1.0f32, 7.0], &[2]), arr(vec![3.0f32], &[1])],
        &OpArg::None,
    );
    assert_eq!(m.to_vec::<f32>().unwrap(), vec![3.0, 7.0]);
}

// ============================================================================
// Reduce ops
// ============================================================================

#[test]
fn test_sum_rows() {
    let interp = interp();
    let r = run(
        &interp,
        ReduceOp::Sum,
        &[arr(vec![1i32, 2, 3, 4, 5, 6], &[2, 3])],
        &OpArg::shape([2, 1]),
    );
    assert_eq!(r.shape().dims(), &[2, 1]);
    assert_eq!(r.to_vec::<i32>().unwrap(), vec![6, 15]);
}

#[test]
fn test_reduce_max_and_identity() {
    let interp = interp();
    let x = arr(vec![4.0f32, -1.0, 2.0, 8.0], &[2, 2]);
    let r = run(&interp, ReduceOp::Max, &[x.clone()], &OpArg::shape([1, 2]));
    assert_eq!(r.to_vec::<f32>().unwrap(), vec![4.0, 8.0]);

    let same = run(&interp, ReduceOp::Sum, &[x.clone()], &OpArg::shape([2, 2]));
    assert!(same.shares_storage(x.as_array().unwrap()));
}

#[test]
fn test_reduced_axes_property() {
    let shapes = [[1usize, 1, 4], [2, 1, 4], [2, 3, 1], [2, 3, 4]];
    for old in &shapes {
        for new in &shapes {
            let axes = reduced_axes(&Shape::new(old), &Shape::new(new)).unwrap();
            for i in 0..3 {
                assert_eq!(axes.contains(&i), old[i] != new[i]);
            }
        }
        assert!(reduced_axes(&Shape::new(old), &Shape::new(old)).unwrap().is_empty());
    }
}

#[test]
fn test_promote_property() {
    for &a in DType::ALL.iter() {
        assert_eq!(promote(a, a), a);
        for &b in DType::ALL.iter() {
            assert_eq!(promote(a, b), promote(b, a));
            assert!(promote(a, b) >= a && promote(a, b) >= b);
        }
    }
}

// ============================================================================
// Movement ops
// ============================================================================

#[test]
fn test_as_strided_roundtrip() {
    let interp = interp();
    let data: Vec<f32> = (0..24).map(|i| i as f32).collect();
    let x = arr(data.clone(), &[2, 3, 4]);
    let shape = Shape::new(&[2, 3, 4]);
    let r = run(
        &interp,
        MovementOp::AsStrided,
        &[x],
        &OpArg::strided(shape.clone(), &shape.contiguous_strides(), 0),
    );
    assert_eq!(r.to_vec::<f32>().unwrap(), data);
}

#[test]
fn test_as_strided_checked_rejects_out_of_bounds() {
    let interp = interp();
    let err = interp
        .execute(
            MovementOp::AsStrided,
            &[arr(vec![1u8, 2, 3], &[3])],
            &OpArg::strided([2], &[1], 2),
        )
        .unwrap_err();
    assert_eq!(
        err,
        ExecError::Core(TesselError::OutOfBoundsView { min: 2, max: 3, len: 3 })
    );
}

#[test]
fn test_as_strided_unchecked_trusts_valid_layout() {
    init_tracing();
    let interp = Interpreter::new(InterpreterConfig::default().with_check_views(false));
    let r = run(
        &interp,
        MovementOp::AsStrided,
        &[arr(vec![1u8, 2, 3], &[3])],
        &OpArg::strided([2, 2], &[1, 0], 1),
    );
    assert_eq!(r.to_vec::<u8>().unwrap(), vec![2, 2, 3, 3]);

    let err = interp
        .execute(MovementOp::AsStrided, &[arr(vec![1u8, 2, 3], &[3])], &OpArg::strided([2, 2], &[1], 0))
        .unwrap_err();
    assert!(matches!(err, ExecError::Core(TesselError::ShapeMismatch { .. })));
}

#[test]
fn test_pad_expand_reshape_permute_shrink() {
    let interp = interp();
    let x = arr(vec![1i32, 2, 3, 4, 5, 6], &[2, 3]);

    let p = run(&interp, MovementOp::Pad, &[x.clone()], &OpArg::padding(&[(0, 1), (1, 0)]));
    assert_eq!(p.shape().dims(), &[3, 4]);
    assert_eq!(p.to_vec::<i32>().unwrap(), vec![0, 1, 2, 3, 0, 4, 5, 6, 0, 0, 0, 0]);

    let r = run(&interp, MovementOp::Reshape, &[x.clone()], &OpArg::shape([3, 2]));
    assert_eq!(r.shape().dims(), &[3, 2]);

    let t = run(&interp, MovementOp::Permute, &[x.clone()], &OpArg::Permutation(vec![1, 0]));
    assert_eq!(t.to_vec::<i32>().unwrap(), vec![1, 4, 2, 5, 3, 6]);

    let s = run(&interp, MovementOp::Shrink, &[x.clone()], &OpArg::Bounds(vec![(1, 2), (0, 2)]));
    assert_eq!(s.to_vec::<i32>().unwrap(), vec![4, 5]);

    let row = arr(vec![7i32, 8, 9], &[1, 3]);
    let e = run(&interp, MovementOp::Expand, &[row.clone()], &OpArg::shape([2, 3]));
    assert_eq!(e.strides(), &[0, 1]);
    assert!(e.shares_storage(row.as_array().unwrap()));
}

#[test]
fn test_pad_with_fill_value() {
    let interp = interp();
    let x = arr(vec![1.5f32, 2.5], &[1, 2]);
    let p = run(&interp, MovementOp::Pad, &[x], &OpArg::padding_with(&[(1, 0), (0, 1)], -1.0f32));
    assert_eq!(p.shape().dims(), &[2, 3]);
    assert_eq!(p.to_vec::<f32>().unwrap(), vec![-1.0, -1.0, -1.0, 1.5, 2.5, -1.0]);
}

// ============================================================================
// Ternary ops
// ============================================================================

#[test]
fn test_mulacc_matmul_example() {
    let interp = interp();
    let a = Array::from_vec(vec![1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0], [2, 3]).unwrap();
    let b = Array::from_vec(vec![1.0f32, 0.0, 0.0, 1.0, 1.0, 1.0], [3, 2]).unwrap();
    let a = a.reshape([2, 3, 1]).unwrap().expand([2, 3, 2]).unwrap();
    let b = b.reshape([1, 3, 2]).unwrap().expand([2, 3, 2]).unwrap();

    let r = run(&interp, TernaryOp::MulAcc, &[a.into(), b.into()], &OpArg::shape([2, 1, 2]));
    assert_eq!(r.shape().dims(), &[2, 1, 2]);
    assert_close(&r.to_vec::<f32>().unwrap(), &[4.0, 5.0, 10.0, 11.0], 1e-6);
}

#[test]
fn test_batched_mulacc_equals_per_batch_matmul() {
    let interp = interp();
    let (batch, m, k, n) = (3, 2, 4, 3);
    let a_data: Vec<f32> = (0..batch * m * k).map(|i| ((i * 7 + 3) % 13) as f32 * 0.5 - 3.0).collect();
    let b_data: Vec<f32> = (0..batch * k * n).map(|i| ((i * 11 + 5) % 17) as f32 * 0.25 - 2.0).collect();

    let a = Array::from_vec(a_data.clone(), [batch, m, k, 1]).unwrap().expand([batch, m, k, n]).unwrap();
    let b = Array::from_vec(b_data.clone(), [batch, 1, k, n]).unwrap().expand([batch, m, k, n]).unwrap();
    let r = run(
        &interp,
        TernaryOp::MulAcc,
        &[a.into(), b.into()],
        &OpArg::shape([batch, m, 1, n]),
    );

    let mut expected = vec![0.0f32; batch * m * n];
    for bi in 0..batch {
        for i in 0..m {
            for j in 0..n {
                let mut acc = 0.0f32;
                for p in 0..k {
                    acc += a_data[(bi * m + i) * k + p] * b_data[(bi * k + p) * n + j];
                }
                expected[(bi * m + i) * n + j] = acc;
            }
        }
    }
    assert_close(&r.to_vec::<f32>().unwrap(), &expected, 1e-4);
}

#[test]
fn test_batched_mulacc_with_shared_rhs() {
    let interp = interp();
    let (batch, m, k, n) = (2, 2, 3, 2);
    let a_data: Vec<f32> = (0..batch * m * k).map(|i| i as f32).collect();
    let b_data: Vec<f32> = vec![1.0, 0.0, 0.0, 1.0, 1.0, 1.0];

    let a = Array::from_vec(a_data.clone(), [batch, m, k, 1]).unwrap().expand([batch, m, k, n]).unwrap();
    let b = Array::from_vec(b_data.clone(), [1, 1, k, n]).unwrap().expand([batch, m, k, n]).unwrap();
    assert_eq!(b.strides()[0], 0);
    let r = run(
        &interp,
        TernaryOp::MulAcc,
        &[a.into(), b.into()],
        &OpArg::shape([batch, m, 1, n]),
    );
    assert_eq!(r.shape().dims(), &[batch, m, 1, n]);

    let got = r.to_vec::<f32>().unwrap();
    for bi in 0..batch {
        let lhs = &a_data[bi * m * k..(bi + 1) * m * k];
        let mut plain = vec![0.0f32; m * n];
        for i in 0..m {
            for j in 0..n {
                plain[i * n + j] = (0..k).map(|p| lhs[i * k + p] * b_data[p * n + j]).sum();
            }
        }
        assert_close(&got[bi * m * n..(bi + 1) * m * n], &plain, 1e-6);
    }
    assert_close(&got, &[2.0, 3.0, 8.0, 9.0, 14.0, 15.0, 20.0, 21.0], 1e-6);
}

#[test]
fn test_mulacc_axis_broadcast_in_both_operands() {
    let interp = interp();
    let a = Array::from_vec(vec![1i32, 2], [1, 2]).unwrap().expand([3, 2]).unwrap();
    let b = Array::from_vec(vec![5i32, 7], [1, 2]).unwrap().expand([3, 2]).unwrap();
    let fused = run(&interp, TernaryOp::MulAcc, &[a.clone().into(), b.clone().into()], &OpArg::shape([1, 1]));
    let direct = a.mul(&b).unwrap().sum_to([1, 1]).unwrap();
    assert_eq!(fused.to_vec::<i32>().unwrap(), direct.to_vec::<i32>().unwrap());
    assert_eq!(fused.to_vec::<i32>().unwrap(), vec![57]);
}

#[test]
fn test_where_selects_elementwise() {
    let interp = interp();
    let r = run(
        &interp,
        TernaryOp::Where,
        &[
            arr(vec![1u8, 0, 2, 0], &[2, 2]),
            arr(vec![1.0f32, 2.0, 3.0, 4.0], &[2, 2]),
            arr(vec![-1.0f32, -2.0, -3.0, -4.0], &[2, 2]),
        ],
        &OpArg::None,
    );
    assert_eq!(r.to_vec::<f32>().unwrap(), vec![1.0, -2.0, 3.0, -4.0]);
}

// ============================================================================
// Dispatch errors
// ============================================================================

#[test]
fn test_bad_argument() {
    let interp = interp();
    let err = interp
        .execute(ReduceOp::Sum, &[arr(vec![1.0f32], &[1])], &OpArg::None)
        .unwrap_err();
    assert_eq!(
        err,
        ExecError::BadArgument {
            op: Op::Reduce(ReduceOp::Sum),
            expected: "shape"
        }
    );
}

#[test]
fn test_operand_kind() {
    let interp = interp();
    let err = interp
        .execute(UnaryOp::Neg, &[Buffer::new(2, DType::F32).into()], &OpArg::None)
        .unwrap_err();
    assert!(matches!(err, ExecError::OperandKind { expected: "array", .. }));
}

#[test]
fn test_failure_leaves_operands_usable() {
    let interp = interp();
    let x = arr(vec![true, false], &[2]);
    let err = interp
        .execute(BinaryOp::Sub, &[x.clone(), x.clone()], &OpArg::None)
        .unwrap_err();
    assert!(matches!(err, ExecError::Core(TesselError::UnsupportedDType { .. })));
    let r = run(&interp, BinaryOp::Add, &[x.clone(), x], &OpArg::None);
    assert_eq!(r.to_vec::<bool>().unwrap(), vec![true, false]);
}

#[test]
fn test_shared_across_threads() {
    let interp = interp();
    let x = arr(vec![1i64, 2, 3], &[3]);
    std::thread::scope(|s| {
        for t in 0..4i64 {
            let interp = &interp;
            let x = x.clone();
            s.spawn(move || {
                let c: Value = Array::scalar(Scalar::Int(t), DType::I64).into();
                let r = run(interp, BinaryOp::Mul, &[x, c], &OpArg::None);
                assert_eq!(r.to_vec::<i64>().unwrap(), vec![t, 2 * t, 3 * t]);
            });
        }
    });
}
