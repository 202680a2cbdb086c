// frontend/src/telemetry/dms.rs

/// Decimal degrees to signed `D:MM:SS.ssss`.
///
/// Degrees and minutes are truncated, seconds rounded to four decimals.
/// Seconds are not carried into minutes, so `59.99999` renders as `60.0000`.
pub fn to_dms(value: f64) -> String {
    let sign = if value < 0.0 { "-" } else { "" };
    let v = value.abs();

    let deg = v.trunc();
    let min_f = (v - deg) * 60.0;
    let min = min_f.trunc();
    let sec = (min_f - min) * 60.0;

    format!("{sign}{}:{:02}:{sec:07.4}", deg as u64, min as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sydney_coordinates() {
        assert_eq!(to_dms(-33.865), "-33:51:54.0000");
        assert_eq!(to_dms(151.209), "151:12:32.4000");
    }

    #[test]
    fn small_values_are_padded() {
        assert_eq!(to_dms(0.0), "0:00:00.0000");
        assert_eq!(to_dms(1.5), "1:30:00.0000");
        assert_eq!(to_dms(-0.0025), "-0:00:09.0000");
    }
}
