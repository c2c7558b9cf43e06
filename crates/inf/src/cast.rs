use num::{Bounded, NumCast, ToPrimitive};

/// Convert a value to the closest value representable in `T`, returned as f64.
/// Values outside of the range of `T` saturate at the type bounds, NaN maps to 0 for integer types.
pub fn saturating_cast<T: NumCast + Bounded + ToPrimitive>(v: f64) -> f64 {
    if let Some(x) = <T as NumCast>::from(v).and_then(|x: T| x.to_f64()) {
        return x;
    }

    if v.is_nan() {
        return 0.0;
    }

    let bound = if v < 0.0 { T::min_value() } else { T::max_value() };
    bound.to_f64().unwrap_or(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn saturate() {
        assert_eq!(saturating_cast::<u8>(300.0), 255.0);
        assert_eq!(saturating_cast::<u8>(-3.0), 0.0);
        assert_eq!(saturating_cast::<i8>(-300.0), -128.0);
        assert_eq!(saturating_cast::<u16>(f64::NAN), 0.0);
        approx::assert_relative_eq!(saturating_cast::<f32>(0.1), 0.1f32 as f64);
    }
}
