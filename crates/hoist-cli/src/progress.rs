use std::io::Write;
use std::time::{Duration, Instant};

const TICK: Duration = Duration::from_millis(250);
const BAR_WIDTH: usize = 24;
const SPINNER: [char; 4] = ['|', '/', '-', '\\'];

/// Render a progress line on stdout while `fut` runs.
///
/// The bar fills against `estimate` seconds — the recorded duration of
/// the last run of the same action. Without an estimate it degrades to a
/// spinner. The external work itself is untouched; this only polls for
/// its completion while ticking the display.
pub async fn duration_progress<F: Future>(
    label: &str,
    estimate: Option<f64>,
    fut: F,
) -> F::Output {
    tokio::pin!(fut);
    let started = Instant::now();
    let mut ticker = tokio::time::interval(TICK);

    let output = loop {
        tokio::select! {
            output = &mut fut => break output,
            _ = ticker.tick() => {
                print!("\r{label} {}", frame(estimate, started.elapsed()));
                let _ = std::io::stdout().flush();
            }
        }
    };

    println!(
        "\r{label} done in {:.1}s{}",
        started.elapsed().as_secs_f64(),
        " ".repeat(BAR_WIDTH)
    );
    output
}

fn frame(estimate: Option<f64>, elapsed: Duration) -> String {
    match estimate {
        Some(total) if total > 0.0 => {
            let ratio = (elapsed.as_secs_f64() / total).min(1.0);
            format!("[{}] {:3.0}%", bar(ratio), ratio * 100.0)
        }
        _ => SPINNER[(elapsed.as_millis() / TICK.as_millis()) as usize % SPINNER.len()].to_string(),
    }
}

fn bar(ratio: f64) -> String {
    let filled = (ratio * BAR_WIDTH as f64).round() as usize;
    format!("{}{}", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled))
}
