//! Moving Average Convergence/Divergence (MACD).
//!
//! Line = EMA(fast) - EMA(slow); Signal = EMA(signal) of the line, seeded from
//! the first `signal` defined line values; Histogram = Line - Signal.
//!
//! Exposed as three named instances, one per output series.
//! Lookback: slow-1 for the line, slow-1 + signal-1 for signal and histogram
//! (with the usual fast < slow; in general max(fast, slow) replaces slow).

use super::ema::ema_of_series;
use super::indicator::Indicator;
use crate::domain::Bar;

/// Which MACD output series to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacdOutput {
    Line,
    Signal,
    Histogram,
}

#[derive(Debug, Clone)]
pub struct Macd {
    fast: usize,
    slow: usize,
    signal: usize,
    output: MacdOutput,
    name: String,
}

/// All three MACD series for one close series.
#[derive(Debug, Clone)]
pub struct MacdSeries {
    pub line: Vec<f64>,
    pub signal: Vec<f64>,
    pub histogram: Vec<f64>,
}

impl Macd {
    fn build(fast: usize, slow: usize, signal: usize, output: MacdOutput) -> Self {
        assert!(
            fast >= 1 && slow >= 1 && signal >= 1,
            "MACD periods must be >= 1"
        );
        let name = match output {
            MacdOutput::Line => format!("macd_{fast}_{slow}"),
            MacdOutput::Signal => format!("macd_signal_{fast}_{slow}_{signal}"),
            MacdOutput::Histogram => format!("macd_hist_{fast}_{slow}_{signal}"),
        };
        Self {
            fast,
            slow,
            signal,
            output,
            name,
        }
    }

    pub fn line(fast: usize, slow: usize, signal: usize) -> Self {
        Self::build(fast, slow, signal, MacdOutput::Line)
    }

    pub fn signal(fast: usize, slow: usize, signal: usize) -> Self {
        Self::build(fast, slow, signal, MacdOutput::Signal)
    }

    pub fn histogram(fast: usize, slow: usize, signal: usize) -> Self {
        Self::build(fast, slow, signal, MacdOutput::Histogram)
    }

    pub fn output(&self) -> MacdOutput {
        self.output
    }
}

impl Indicator for Macd {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        let line = self.fast.max(self.slow) - 1;
        match self.output {
            MacdOutput::Line => line,
            MacdOutput::Signal | MacdOutput::Histogram => line + self.signal - 1,
        }
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let series = macd_of_series(&closes, self.fast, self.slow, self.signal);
        match self.output {
            MacdOutput::Line => series.line,
            MacdOutput::Signal => series.signal,
            MacdOutput::Histogram => series.histogram,
        }
    }
}

/// Compute line, signal and histogram together.
pub fn macd_of_series(values: &[f64], fast: usize, slow: usize, signal: usize) -> MacdSeries {
    let fast_ema = ema_of_series(values, fast);
    let slow_ema = ema_of_series(values, slow);

    // NaN in either leg keeps the line NaN.
    let line: Vec<f64> = fast_ema
        .iter()
        .zip(&slow_ema)
        .map(|(f, s)| f - s)
        .collect();

    let signal_line = ema_of_series(&line, signal);
    let histogram = line
        .iter()
        .zip(&signal_line)
        .map(|(l, s)| l - s)
        .collect();

    MacdSeries {
        line,
        signal: signal_line,
        histogram,
    }
}
