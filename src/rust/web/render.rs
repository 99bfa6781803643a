//! Server-side HTML for the analysis page.
//!
//! Pages are self-contained: CSS is inlined and the chart is an inline SVG, so the
//! page needs no scripts or external assets.

use std::fmt::Write;

use crate::classifier::ScoreResult;
use crate::scorer::Analysis;

/// What the page shows below the input form
#[derive(Debug)]
pub enum Outcome<'a> {
    Idle,
    Warning(&'a str),
    Success(&'a Analysis),
    Failure(&'a str),
}

/// Qualitative pastel palette, cycled when there are more labels than colors
const PALETTE: [&str; 11] = [
    "#66c5cc", "#f6cf71", "#f89c74", "#dcb0f2", "#87c55f", "#9eb9f3",
    "#fe88b1", "#c9db74", "#8be0a4", "#b497e7", "#b3b3b3",
];

const CHART_WIDTH: f32 = 720.0;
const CHART_HEIGHT: f32 = 360.0;
const MARGIN_LEFT: f32 = 64.0;
const MARGIN_RIGHT: f32 = 16.0;
const MARGIN_TOP: f32 = 40.0;
const MARGIN_BOTTOM: f32 = 56.0;

/// Render the full page: form, outcome and footer
pub fn render_page(text: &str, outcome: &Outcome<'_>) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Emotion Detection</title>
    <style>{css}</style>
</head>
<body>
    <main class="container">
        <h1>Emotion Detection</h1>
        <p class="intro">Enter text below to analyze its emotional tone and get a detailed breakdown.</p>
        {form}
        {outcome}
        {footer}
    </main>
</body>
</html>"#,
        css = inline_css(),
        form = render_form(text),
        outcome = render_outcome(outcome),
        footer = render_footer(),
    )
}

fn render_form(text: &str) -> String {
    format!(
        r#"<form method="post" action="/analyze">
            <label for="text">Type your text here:</label>
            <textarea id="text" name="text" rows="6">{text}</textarea>
            <button type="submit">Analyze Emotions</button>
        </form>"#,
        text = html_escape(text),
    )
}

fn render_outcome(outcome: &Outcome<'_>) -> String {
    match outcome {
        Outcome::Idle => String::new(),
        Outcome::Warning(message) => format!(
            r#"<div class="message warning">{}</div>"#,
            html_escape(message)
        ),
        Outcome::Failure(message) => format!(
            r#"<div class="message error">Analysis failed: {}</div>"#,
            html_escape(message)
        ),
        Outcome::Success(analysis) => format!(
            r#"<div class="message success">Dominant Emotion: <strong>{label}</strong> ({score})</div>
        <h2>Emotion Breakdown</h2>
        {chart}
        <h2>Detailed Emotion Scores</h2>
        {details}"#,
            label = html_escape(&analysis.dominant.label),
            score = format_score(analysis.dominant.score),
            chart = render_chart(&analysis.scores),
            details = render_details(&analysis.scores),
        ),
    }
}

/// Two-decimal score as shown in the summary and the detail list
pub fn format_score(score: f32) -> String {
    format!("{:.2}", score)
}

/// Bar chart of confidence per label, bars in the order given
pub fn render_chart(scores: &[ScoreResult]) -> String {
    let plot_width = CHART_WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
    let plot_height = CHART_HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;
    let baseline = MARGIN_TOP + plot_height;
    let slot = plot_width / scores.len().max(1) as f32;
    let bar_width = slot * 0.7;

    let mut svg = String::new();
    let _ = write!(
        svg,
        r#"<svg class="chart" viewBox="0 0 {w} {h}" role="img" aria-label="Confidence Levels for Detected Emotions">
            <text class="title" x="{cx}" y="22" text-anchor="middle">Confidence Levels for Detected Emotions</text>"#,
        w = CHART_WIDTH,
        h = CHART_HEIGHT,
        cx = CHART_WIDTH / 2.0,
    );

    for step in 0..=4 {
        let value = step as f32 * 0.25;
        let y = baseline - value * plot_height;
        let _ = write!(
            svg,
            r#"<line class="grid" x1="{x1}" y1="{y:.1}" x2="{x2}" y2="{y:.1}"/><text class="tick" x="{tx}" y="{ty:.1}" text-anchor="end">{value:.2}</text>"#,
            x1 = MARGIN_LEFT,
            x2 = CHART_WIDTH - MARGIN_RIGHT,
            tx = MARGIN_LEFT - 8.0,
            ty = y + 4.0,
        );
    }

    for (i, result) in scores.iter().enumerate() {
        let value = if result.score.is_nan() { 0.0 } else { result.score.clamp(0.0, 1.0) };
        let height = value * plot_height;
        let x = MARGIN_LEFT + slot * i as f32 + (slot - bar_width) / 2.0;
        let label = html_escape(&result.label);
        let _ = write!(
            svg,
            r#"<rect class="bar" x="{x:.1}" y="{y:.1}" width="{bw:.1}" height="{height:.1}" fill="{color}"><title>{label}: {score}</title></rect><text class="tick" x="{lx:.1}" y="{ly:.1}" text-anchor="middle">{label}</text>"#,
            y = baseline - height,
            bw = bar_width,
            color = PALETTE[i % PALETTE.len()],
            score = format_score(result.score),
            lx = x + bar_width / 2.0,
            ly = baseline + 18.0,
        );
    }

    let _ = write!(
        svg,
        r#"<text class="axis" x="{cx}" y="{by}" text-anchor="middle">Emotion</text><text class="axis" x="16" y="{cy}" text-anchor="middle" transform="rotate(-90 16 {cy})">Confidence</text></svg>"#,
        cx = MARGIN_LEFT + plot_width / 2.0,
        by = CHART_HEIGHT - 12.0,
        cy = MARGIN_TOP + plot_height / 2.0,
    );
    svg
}

fn render_details(scores: &[ScoreResult]) -> String {
    let items: String = scores
        .iter()
        .map(|s| format!(
            "<li><strong>{}:</strong> {}</li>",
            html_escape(&s.label),
            format_score(s.score)
        ))
        .collect();
    format!(r#"<ul class="scores">{}</ul>"#, items)
}

fn render_footer() -> &'static str {
    r#"<hr><p class="footer">Made with Rust, ONNX Runtime and axum</p>"#
}

fn inline_css() -> &'static str {
    r#"
body { background-color: #f0f2f6; color: #333333; font-family: -apple-system, 'Segoe UI', Helvetica, Arial, sans-serif; margin: 0; }
.container { max-width: 960px; margin: 0 auto; padding: 24px; }
form { display: flex; flex-direction: column; gap: 8px; }
textarea { background-color: #ffffff; border: 1px solid #d0d4dc; border-radius: 10px; padding: 10px; font-size: 15px; }
button { align-self: flex-start; background-color: #4CAF50; color: white; border: none; border-radius: 10px; padding: 10px 20px; font-size: 16px; cursor: pointer; }
button:hover { background-color: #45a049; }
.message { margin-top: 16px; padding: 12px 16px; border-radius: 8px; }
.success { background-color: #e3f5e6; color: #1e6b2c; }
.warning { background-color: #fff5d6; color: #7a5b00; }
.error { background-color: #fde2e1; color: #8a1c17; }
.chart { width: 100%; height: auto; background: #ffffff; border-radius: 8px; }
.chart .grid { stroke: #e5e7eb; stroke-width: 1; }
.chart .tick { font-size: 12px; fill: #555555; }
.chart .axis { font-size: 13px; fill: #333333; }
.chart .title { font-size: 15px; fill: #333333; }
.scores { list-style: none; padding: 0; }
.footer { text-align: center; color: gray; }
"#
}

/// Escape HTML special characters
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_analysis() -> Analysis {
        let scores = vec![
            ScoreResult::new("sadness", 0.02),
            ScoreResult::new("joy", 0.91),
            ScoreResult::new("love", 0.03),
            ScoreResult::new("anger", 0.02),
            ScoreResult::new("fear", 0.01),
            ScoreResult::new("surprise", 0.01),
        ];
        Analysis {
            dominant: scores[1].clone(),
            scores,
        }
    }

    #[test]
    fn html_escapes_special_chars() {
        assert_eq!(html_escape(r#"<b>"Tom" & 'Jerry'</b>"#), "&lt;b&gt;&quot;Tom&quot; &amp; &#39;Jerry&#39;&lt;/b&gt;");
    }

    #[test]
    fn chart_has_one_bar_per_label() {
        let analysis = sample_analysis();
        let svg = render_chart(&analysis.scores);
        assert_eq!(svg.matches(r#"class="bar""#).count(), 6);
        assert!(svg.contains("<title>joy: 0.91</title>"));
        assert!(svg.find(">sadness<").unwrap() < svg.find(">surprise<").unwrap());
    }

    #[test]
    fn success_page_shows_summary_and_details() {
        let analysis = sample_analysis();
        let page = render_page("I am so happy today!", &Outcome::Success(&analysis));
        assert!(page.contains("Dominant Emotion: <strong>joy</strong> (0.91)"));
        assert!(page.contains("<li><strong>fear:</strong> 0.01</li>"));
        assert!(page.contains("<svg"));
        assert!(page.contains("I am so happy today!</textarea>"));
    }

    #[test]
    fn warning_page_has_no_chart() {
        let page = render_page("", &Outcome::Warning("Please enter some text before analyzing."));
        assert!(page.contains("Please enter some text before analyzing."));
        assert!(!page.contains("<svg"));
        assert!(!page.contains("Detailed Emotion Scores"));
    }

    #[test]
    fn user_text_is_escaped() {
        let page = render_page("<script>alert(1)</script>", &Outcome::Idle);
        assert!(!page.contains("<script>"));
        assert!(page.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
    }

    #[test]
    fn out_of_range_scores_stay_inside_the_plot() {
        let svg = render_chart(&[ScoreResult::new("odd", 1.7), ScoreResult::new("nan", f32::NAN)]);
        assert!(svg.contains(r#"y="40.0""#));
        assert!(!svg.contains("height=\"-"));
    }
}
