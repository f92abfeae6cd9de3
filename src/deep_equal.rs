use crate::tree::Scalar;

/// Recursively checks if two scalar values are deeply equal.
///
/// Reals compare numerically when both texts parse, so `1.0` and `1.00`
/// are the same value, and an integer equals a real of the same value
/// (`dt: 1` and `dt: 1.0`).
pub fn deep_equal(a: &Scalar, b: &Scalar) -> bool {
    match (a, b) {
        (Scalar::Real(a_str), Scalar::Real(b_str)) => real_equal(a_str, b_str),
        (Scalar::Integer(i), Scalar::Real(r)) | (Scalar::Real(r), Scalar::Integer(i)) => {
            parse_real(r).map_or(false, |x| x == *i as f64)
        }
        (Scalar::Integer(a_int), Scalar::Integer(b_int)) => a_int == b_int,
        (Scalar::String(a_str), Scalar::String(b_str)) => a_str == b_str,
        (Scalar::Boolean(a_bool), Scalar::Boolean(b_bool)) => a_bool == b_bool,
        (Scalar::Array(a_vec), Scalar::Array(b_vec)) => {
            if a_vec.len() != b_vec.len() {
                false
            } else {
                a_vec.iter().zip(b_vec.iter()).all(|(a_item, b_item)| deep_equal(a_item, b_item))
            }
        }
        (Scalar::Null, Scalar::Null) => true,
        _ => false,
    }
}

fn real_equal(a: &str, b: &str) -> bool {
    if a == b {
        return true;
    }
    match (parse_real(a), parse_real(b)) {
        // NaN is a value like any other here, whatever its spelling.
        (Some(x), Some(y)) if x.is_nan() && y.is_nan() => true,
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}

// YAML spells infinities and NaN with a leading dot.
fn parse_real(text: &str) -> Option<f64> {
    match text {
        ".nan" | ".NaN" | ".NAN" => Some(f64::NAN),
        ".inf" | "+.inf" | ".Inf" | "+.Inf" | ".INF" | "+.INF" => Some(f64::INFINITY),
        "-.inf" | "-.Inf" | "-.INF" => Some(f64::NEG_INFINITY),
        _ => text.parse::<f64>().ok(),
    }
}
