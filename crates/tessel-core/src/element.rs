//! Native element types and the dtype-erased [`Scalar`] carrier.

use std::fmt;

use half::{bf16, f16};

use crate::dtype::DType;
use crate::storage::HostData;

/// A single value detached from any particular element type.
///
/// Used for constants, element reads and value casts. Converting into an
/// element type follows C `astype` rules: integer narrowing wraps,
/// float to integer truncates toward zero, anything to bool tests `!= 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
}

impl Scalar {
    /// Value as an `f64`, for comparisons in tests and diagnostics.
    pub fn to_f64(self) -> f64 {
        match self {
            Scalar::Bool(b) => b as u8 as f64,
            Scalar::Int(i) => i as f64,
            Scalar::UInt(u) => u as f64,
            Scalar::Float(f) => f,
        }
    }

    pub fn is_nonzero(self) -> bool {
        match self {
            Scalar::Bool(b) => b,
            Scalar::Int(i) => i != 0,
            Scalar::UInt(u) => u != 0,
            Scalar::Float(f) => f != 0.0,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(b) => write!(f, "{b}"),
            Scalar::Int(i) => write!(f, "{i}"),
            Scalar::UInt(u) => write!(f, "{u}"),
            Scalar::Float(v) => write!(f, "{v}"),
        }
    }
}

impl From<bool> for Scalar {
    fn from(v: bool) -> Self {
        Scalar::Bool(v)
    }
}

impl From<i32> for Scalar {
    fn from(v: i32) -> Self {
        Scalar::Int(v as i64)
    }
}

impl From<i64> for Scalar {
    fn from(v: i64) -> Self {
        Scalar::Int(v)
    }
}

impl From<u64> for Scalar {
    fn from(v: u64) -> Self {
        Scalar::UInt(v)
    }
}

impl From<f32> for Scalar {
    fn from(v: f32) -> Self {
        Scalar::Float(v as f64)
    }
}

impl From<f64> for Scalar {
    fn from(v: f64) -> Self {
        Scalar::Float(v)
    }
}

/// A native Rust type backing one [`DType`].
///
/// Arithmetic follows numpy semantics for the type: integers wrap, bools
/// treat `plus` as logical or and `times` as logical and.
pub trait Element: Copy + PartialOrd + Send + Sync + fmt::Debug + 'static {
    const DTYPE: DType;

    fn zero() -> Self;

    fn to_scalar(self) -> Scalar;

    fn from_scalar(value: Scalar) -> Self;

    fn plus(self, rhs: Self) -> Self;

    /// Only SUB reaches this for bools after rejecting them, so the bool
    /// impl (exclusive or) is never observable through the interpreter.
    fn minus(self, rhs: Self) -> Self;

    fn times(self, rhs: Self) -> Self;

    /// True division computed wide, then cast back to `Self`.
    fn divide(self, rhs: Self) -> Self;

    /// Maximum that propagates NaN.
    fn maximum(self, rhs: Self) -> Self;

    /// Logical not for bools, wrapping negation for integers.
    fn negate(self) -> Self;

    fn is_nonzero(self) -> bool;

    fn wrap(data: Vec<Self>) -> HostData;

    fn slice(data: &HostData) -> Option<&[Self]>;

    fn cast<U: Element>(self) -> U {
        U::from_scalar(self.to_scalar())
    }
}

macro_rules! impl_host_access {
    ($t:ty, $variant:ident) => {
        fn wrap(data: Vec<Self>) -> HostData {
            HostData::$variant(data)
        }

        fn slice(data: &HostData) -> Option<&[Self]> {
            match data {
                HostData::$variant(v) => Some(v),
                _ => None,
            }
        }
    };
}

macro_rules! impl_int_element {
    ($($t:ty => $variant:ident, $carrier:ident, $wide:ty);* $(;)?) => {
        $(
            impl Element for $t {
                const DTYPE: DType = DType::$variant;

                fn zero() -> Self {
                    0
                }

                fn to_scalar(self) -> Scalar {
                    Scalar::$carrier(self as $wide)
                }

                fn from_scalar(value: Scalar) -> Self {
                    match value {
                        Scalar::Bool(b) => b as $t,
                        Scalar::Int(i) => i as $t,
                        Scalar::UInt(u) => u as $t,
                        Scalar::Float(f) => f as $t,
                    }
                }

                fn plus(self, rhs: Self) -> Self {
                    self.wrapping_add(rhs)
                }

                fn minus(self, rhs: Self) -> Self {
                    self.wrapping_sub(rhs)
                }

                fn times(self, rhs: Self) -> Self {
                    self.wrapping_mul(rhs)
                }

                fn divide(self, rhs: Self) -> Self {
                    (self as f64 / rhs as f64) as $t
                }

                fn maximum(self, rhs: Self) -> Self {
                    self.max(rhs)
                }

                fn negate(self) -> Self {
                    self.wrapping_neg()
                }

                fn is_nonzero(self) -> bool {
                    self != 0
                }

                impl_host_access!($t, $variant);
            }
        )*
    };
}

impl_int_element! {
    i8 => I8, Int, i64;
    u8 => U8, UInt, u64;
    i16 => I16, Int, i64;
    u16 => U16, UInt, u64;
    i32 => I32, Int, i64;
    u32 => U32, UInt, u64;
    i64 => I64, Int, i64;
    u64 => U64, UInt, u64;
}

macro_rules! impl_float_element {
    ($($t:ty => $variant:ident);* $(;)?) => {
        $(
            impl Element for $t {
                const DTYPE: DType = DType::$variant;

                fn zero() -> Self {
                    0.0
                }

                fn to_scalar(self) -> Scalar {
                    Scalar::Float(self as f64)
                }

                fn from_scalar(value: Scalar) -> Self {
                    match value {
                        Scalar::Bool(b) => b as u8 as $t,
                        Scalar::Int(i) => i as $t,
                        Scalar::UInt(u) => u as $t,
                        Scalar::Float(f) => f as $t,
                    }
                }

                fn plus(self, rhs: Self) -> Self {
                    self + rhs
                }

                fn minus(self, rhs: Self) -> Self {
                    self - rhs
                }

                fn times(self, rhs: Self) -> Self {
                    self * rhs
                }

                fn divide(self, rhs: Self) -> Self {
                    self / rhs
                }

                fn maximum(self, rhs: Self) -> Self {
                    if self.is_nan() || rhs.is_nan() {
                        <$t>::NAN
                    } else {
                        self.max(rhs)
                    }
                }

                fn negate(self) -> Self {
                    -self
                }

                fn is_nonzero(self) -> bool {
                    self != 0.0
                }

                impl_host_access!($t, $variant);
            }
        )*
    };
}

impl_float_element! {
    f32 => F32;
    f64 => F64;
}

// Half-precision arithmetic rounds through f32.
macro_rules! impl_half_element {
    ($($t:ident => $variant:ident);* $(;)?) => {
        $(
            impl Element for $t {
                const DTYPE: DType = DType::$variant;

                fn zero() -> Self {
                    $t::ZERO
                }

                fn to_scalar(self) -> Scalar {
                    Scalar::Float(self.to_f64())
                }

                fn from_scalar(value: Scalar) -> Self {
                    $t::from_f64(value.to_f64())
                }

                fn plus(self, rhs: Self) -> Self {
                    $t::from_f32(self.to_f32() + rhs.to_f32())
                }

                fn minus(self, rhs: Self) -> Self {
                    $t::from_f32(self.to_f32() - rhs.to_f32())
                }

                fn times(self, rhs: Self) -> Self {
                    $t::from_f32(self.to_f32() * rhs.to_f32())
                }

                fn divide(self, rhs: Self) -> Self {
                    $t::from_f32(self.to_f32() / rhs.to_f32())
                }

                fn maximum(self, rhs: Self) -> Self {
                    if self.is_nan() || rhs.is_nan() {
                        $t::NAN
                    } else if rhs > self {
                        rhs
                    } else {
                        self
                    }
                }

                fn negate(self) -> Self {
                    -self
                }

                fn is_nonzero(self) -> bool {
                    self.to_f32() != 0.0
                }

                impl_host_access!($t, $variant);
            }
        )*
    };
}

impl_half_element! {
    f16 => F16;
    bf16 => BF16;
}

impl Element for bool {
    const DTYPE: DType = DType::Bool;

    fn zero() -> Self {
        false
    }

    fn to_scalar(self) -> Scalar {
        Scalar::Bool(self)
    }

    fn from_scalar(value: Scalar) -> Self {
        value.is_nonzero()
    }

    fn plus(self, rhs: Self) -> Self {
        self || rhs
    }

    fn minus(self, rhs: Self) -> Self {
        self != rhs
    }

    fn times(self, rhs: Self) -> Self {
        self && rhs
    }

    fn divide(self, rhs: Self) -> Self {
        let q = self as u8 as f64 / rhs as u8 as f64;
        q != 0.0
    }

    fn maximum(self, rhs: Self) -> Self {
        self || rhs
    }

    fn negate(self) -> Self {
        !self
    }

    fn is_nonzero(self) -> bool {
        self
    }

    impl_host_access!(bool, Bool);
}

/// Float element types with the transcendental unary ops.
pub trait FloatElement: Element {
    fn exp2(self) -> Self;
    fn log2(self) -> Self;
    fn sin(self) -> Self;
    fn sqrt(self) -> Self;
}

macro_rules! impl_float_native {
    ($($t:ty),*) => {
        $(
            impl FloatElement for $t {
                fn exp2(self) -> Self {
                    <$t>::exp2(self)
                }

                fn log2(self) -> Self {
                    <$t>::log2(self)
                }

                fn sin(self) -> Self {
                    <$t>::sin(self)
                }

                fn sqrt(self) -> Self {
                    <$t>::sqrt(self)
                }
            }
        )*
    };
}

impl_float_native!(f32, f64);

macro_rules! impl_float_half {
    ($($t:ident),*) => {
        $(
            impl FloatElement for $t {
                fn exp2(self) -> Self {
                    $t::from_f32(self.to_f32().exp2())
                }

                fn log2(self) -> Self {
                    $t::from_f32(self.to_f32().log2())
                }

                fn sin(self) -> Self {
                    $t::from_f32(self.to_f32().sin())
                }

                fn sqrt(self) -> Self {
                    $t::from_f32(self.to_f32().sqrt())
                }
            }
        )*
    };
}

impl_float_half!(f16, bf16);

/// Run `$body` with `$T` bound to the native type of `$dtype`.
macro_rules! with_elem {
    ($dtype:expr, $T:ident => $body:expr) => {
        match $dtype {
            $crate::DType::Bool => {
                type $T = bool;
                $body
            }
            $crate::DType::I8 => {
                type $T = i8;
                $body
            }
            $crate::DType::U8 => {
                type $T = u8;
                $body
            }
            $crate::DType::I16 => {
                type $T = i16;
                $body
            }
            $crate::DType::U16 => {
                type $T = u16;
                $body
            }
            $crate::DType::I32 => {
                type $T = i32;
                $body
            }
            $crate::DType::U32 => {
                type $T = u32;
                $body
            }
            $crate::DType::I64 => {
                type $T = i64;
                $body
            }
            $crate::DType::U64 => {
                type $T = u64;
                $body
            }
            $crate::DType::F16 => {
                type $T = ::half::f16;
                $body
            }
            $crate::DType::BF16 => {
                type $T = ::half::bf16;
                $body
            }
            $crate::DType::F32 => {
                type $T = f32;
                $body
            }
            $crate::DType::F64 => {
                type $T = f64;
                $body
            }
        }
    };
}

/// Like [`with_elem!`] restricted to float dtypes; `$other` runs otherwise.
macro_rules! with_float {
    ($dtype:expr, $T:ident => $body:expr, _ => $other:expr) => {
        match $dtype {
            $crate::DType::F16 => {
                type $T = ::half::f16;
                $body
            }
            $crate::DType::BF16 => {
                type $T = ::half::bf16;
                $body
            }
            $crate::DType::F32 => {
                type $T = f32;
                $body
            }
            $crate::DType::F64 => {
                type $T = f64;
                $body
            }
            _ => $other,
        }
    };
}

pub(crate) use with_elem;
pub(crate) use with_float;
