/// Formats a presentation time in microseconds as `HH:MM:SS.mmm`.
pub fn time_str(us: i64) -> String {
    let sign = if us < 0 { "-" } else { "" };
    let ms = us.unsigned_abs() / 1000;
    let hours = ms / 3_600_000;
    let minutes = (ms % 3_600_000) / 60_000;
    let seconds = (ms % 60_000) / 1000;
    let milliseconds = ms % 1000;

    format!(
        "{sign}{hours:0width$}:{minutes:02}:{seconds:02}.{milliseconds:03}",
        width = if hours >= 100 { 0 } else { 2 }
    )
}

#[test]
fn formats_microseconds() {
    assert_eq!(time_str(0), "00:00:00.000");
    assert_eq!(time_str(33_333), "00:00:00.033");
    assert_eq!(time_str(3_723_456_000), "01:02:03.456");
    assert_eq!(time_str(-1_500_000), "-00:00:01.500");
}
