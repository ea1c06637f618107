use anyhow::Result;
use chrono::Utc;
use colored::Colorize;
use serde::Serialize;
use std::io::Write;
use std::time::Duration;

use crate::common::usize_to_f64;

use super::{ScenarioResult, StrategyAggregate};

#[derive(Serialize)]
struct JsonReport<'a> {
    generated_at: String,
    results: &'a [ScenarioResult],
    aggregates: &'a [StrategyAggregate],
}

fn success_rate(results: &[ScenarioResult]) -> f64 {
    if results.is_empty() {
        return 0.0;
    }
    let passed = results.iter().filter(|r| r.passed).count();
    usize_to_f64(passed) / usize_to_f64(results.len()) * 100.0
}

pub fn generate_console_report(
    out: &mut dyn Write,
    results: &[ScenarioResult],
    aggregates: &[StrategyAggregate],
    total_duration: Duration,
) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "📊 Strategy Test Results Summary".bright_cyan().bold())?;
    writeln!(out, "{}", "=================================".cyan())?;

    let total_tests = results.len();
    let passed_tests = results.iter().filter(|r| r.passed).count();
    let failed_tests = total_tests - passed_tests;

    writeln!(out, "Total scenarios: {total_tests}")?;
    writeln!(out, "Passed: {}", passed_tests.to_string().green())?;
    writeln!(out, "Failed: {}", failed_tests.to_string().red())?;
    writeln!(out, "Success rate: {:.1}%", success_rate(results))?;
    writeln!(out, "Total time: {total_duration:?}")?;
    writeln!(out)?;

    for result in results {
        let status = if result.passed {
            "✅ PASS".green()
        } else {
            "❌ FAIL".red()
        };
        writeln!(
            out,
            "{status} {} (seed {})",
            result.scenario_name.bold(),
            result.seed
        )?;
        writeln!(
            out,
            "   Iterations: {}/{} successful",
            result.successful_iterations, result.iterations_run
        )?;
        writeln!(out, "   Average time: {:?}", result.average_duration)?;

        if !result.failures.is_empty() {
            writeln!(out, "   Failures:")?;
            for failure in &result.failures {
                writeln!(out, "     • {}", failure.red())?;
            }
        }
        writeln!(out)?;
    }

    if !aggregates.is_empty() {
        writeln!(out, "{}", "🏎️  Race Summary".bright_yellow().bold())?;
        writeln!(out, "{}", "===============".yellow())?;
        for aggregate in aggregates {
            writeln!(
                out,
                "{:22} races {:4} | mean {:9.3}s ± {:7.3} | min {:9.3}s | max {:9.3}s | stops {:4.2} | caution laps {:5.2}",
                aggregate.strategy.label().bold(),
                aggregate.races,
                aggregate.mean_race_time_s,
                aggregate.std_race_time_s,
                aggregate.min_race_time_s,
                aggregate.max_race_time_s,
                aggregate.mean_pit_stops,
                aggregate.mean_caution_laps
            )?;
        }
        if let Some(best) = aggregates.first().filter(|a| a.races > 0) {
            writeln!(
                out,
                "Quickest on average: {} ({:.3}s)",
                best.strategy.label().green(),
                best.mean_race_time_s
            )?;
        }
    }

    Ok(())
}

pub fn generate_json_report(
    out: &mut dyn Write,
    results: &[ScenarioResult],
    aggregates: &[StrategyAggregate],
) -> Result<()> {
    let report = JsonReport {
        generated_at: Utc::now().to_rfc3339(),
        results,
        aggregates,
    };
    serde_json::to_writer_pretty(&mut *out, &report)?;
    writeln!(out)?;
    Ok(())
}

pub fn generate_markdown_report(
    out: &mut dyn Write,
    results: &[ScenarioResult],
    aggregates: &[StrategyAggregate],
) -> Result<()> {
    writeln!(out, "# Pitwall Strategy Test Results\n")?;
    writeln!(
        out,
        "_Generated {}_\n",
        Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    )?;

    let total_tests = results.len();
    let passed_tests = results.iter().filter(|r| r.passed).count();

    writeln!(out, "## Summary\n")?;
    writeln!(out, "- **Total scenarios**: {total_tests}")?;
    writeln!(out, "- **Passed**: {passed_tests}")?;
    writeln!(out, "- **Failed**: {}", total_tests - passed_tests)?;
    writeln!(out, "- **Success rate**: {:.1}%\n", success_rate(results))?;

    if !aggregates.is_empty() {
        writeln!(out, "## Strategies\n")?;
        writeln!(
            out,
            "| Strategy | Races | Mean (s) | Std (s) | Min (s) | Max (s) | Pit stops | Caution laps |"
        )?;
        writeln!(out, "|---|---:|---:|---:|---:|---:|---:|---:|")?;
        for aggregate in aggregates {
            writeln!(
                out,
                "| {} | {} | {:.3} | {:.3} | {:.3} | {:.3} | {:.2} | {:.2} |",
                aggregate.strategy.label(),
                aggregate.races,
                aggregate.mean_race_time_s,
                aggregate.std_race_time_s,
                aggregate.min_race_time_s,
                aggregate.max_race_time_s,
                aggregate.mean_pit_stops,
                aggregate.mean_caution_laps
            )?;
        }
        writeln!(out)?;
    }

    writeln!(out, "## Detailed Results\n")?;
    for result in results {
        let status = if result.passed { "✅" } else { "❌" };
        writeln!(
            out,
            "### {status} {} (seed {})\n",
            result.scenario_name, result.seed
        )?;
        writeln!(
            out,
            "- **Iterations**: {}/{} successful",
            result.successful_iterations, result.iterations_run
        )?;
        writeln!(out, "- **Average time**: {:?}", result.average_duration)?;
        if !result.failures.is_empty() {
            writeln!(out, "- **Failures**:")?;
            for failure in &result.failures {
                writeln!(out, "  - {failure}")?;
            }
        }
        writeln!(out)?;
    }

    Ok(())
}

/// One row per race.
pub fn generate_csv_report(out: &mut dyn Write, results: &[ScenarioResult]) -> Result<()> {
    writeln!(
        out,
        "strategy,seed,laps,total_time_s,pit_stops,caution_laps,fastest_lap_s,fingerprint,passed"
    )?;
    for result in results {
        for run in &result.runs {
            let fastest = run
                .summary
                .fastest_lap_s()
                .map(|lap| format!("{lap:.3}"))
                .unwrap_or_default();
            writeln!(
                out,
                "{},{},{},{:.3},{},{},{},{:016x},{}",
                run.strategy.key(),
                run.seed,
                run.summary.laps,
                run.summary.total_time_s,
                run.summary.pit_stops,
                run.summary.caution_laps,
                fastest,
                run.fingerprint,
                run.passed()
            )?;
        }
    }
    Ok(())
}

/// Per-lap render lines captured with `--render`.
pub fn write_render_lines(out: &mut dyn Write, results: &[ScenarioResult]) -> Result<()> {
    for result in results {
        for run in &result.runs {
            if run.render_lines.is_empty() {
                continue;
            }
            writeln!(out, "── {} seed {} ──", run.strategy.label(), run.seed)?;
            for line in &run.render_lines {
                writeln!(out, "{line}")?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::{PitStrategy, StrategyTester, aggregate_results};
    use pitwall_sim::RaceConfig;

    fn sample() -> (Vec<ScenarioResult>, Vec<StrategyAggregate>) {
        let tester =
            StrategyTester::new(RaceConfig::default().with_total_laps(8), false).with_render(true);
        let mut results = tester.run_strategy(PitStrategy::StayOut, &[4, 5], 1);
        results.extend(tester.run_strategy(PitStrategy::TwoStop, &[4], 2));
        let aggregates = aggregate_results(&results);
        (results, aggregates)
    }

    fn render<F>(f: F) -> String
    where
        F: FnOnce(&mut dyn Write) -> Result<()>,
    {
        let mut buf: Vec<u8> = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn csv_has_one_row_per_race() {
        let (results, _) = sample();
        let csv = render(|out| generate_csv_report(out, &results));
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 1 + 4);
        assert!(lines[0].starts_with("strategy,seed,laps"));
        assert!(lines[1].starts_with("stay-out,4,8,"));
        assert!(lines.iter().skip(1).all(|line| line.ends_with(",true")));
    }

    #[test]
    fn json_report_parses_back() {
        let (results, aggregates) = sample();
        let json = render(|out| generate_json_report(out, &results, &aggregates));
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["results"].as_array().unwrap().len(), 3);
        assert_eq!(value["aggregates"].as_array().unwrap().len(), 2);
        assert!(value["generated_at"].is_string());
    }

    #[test]
    fn markdown_lists_strategy_table() {
        let (results, aggregates) = sample();
        let md = render(|out| generate_markdown_report(out, &results, &aggregates));
        assert!(md.starts_with("# Pitwall Strategy Test Results"));
        assert!(md.contains("| Stay Out | 2 |"));
        assert!(md.contains("| Two Stop | 2 |"));
        assert!(md.contains("- **Success rate**: 100.0%"));
    }

    #[test]
    fn console_and_render_output_mention_each_strategy() {
        let (results, aggregates) = sample();
        let console = render(|out| {
            generate_console_report(out, &results, &aggregates, Duration::from_millis(5))
        });
        assert!(console.contains("Stay Out"));
        assert!(console.contains("Two Stop"));
        let lines = render(|out| write_render_lines(out, &results));
        assert!(lines.contains("Lap 8/8"));
    }
}
