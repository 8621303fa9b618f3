// Benchmark helper functions - Rust's dead code analysis doesn't understand
// that these are used by benchmark files in the same directory
// See: https://users.rust-lang.org/t/cargo-rustc-benches-awarnings/110111/2
#[allow(dead_code)]
pub fn generate_theme_source(rows: usize) -> String {
    let row = r#"<div class="row"><span>Time: </span><span component="Hour" options="'alternative': true" title="Hour">21</span>:<span component="Minute" title="Minute">07</span> on <span component="Date" title="Date">2026-10-19</span></div>"#;
    format!(
        "<body style=\"font-family: Sans;\">{}</body>",
        row.repeat(rows)
    )
}
