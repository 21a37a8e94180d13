// ABOUTME: Plan command implementation.
// ABOUTME: Prints the ordered stages without running anything.

use tandem::config::Config;
use tandem::output::{Output, OutputMode};
use tandem::pipeline::plan as build_plan;

pub fn plan(config: &Config, output: &Output) {
    let stages = build_plan(config);

    if output.mode() == OutputMode::Json {
        let names: Vec<&str> = stages.iter().map(|s| s.name()).collect();
        if let Ok(json) = serde_json::to_string(&serde_json::json!({
            "event": "plan",
            "project": config.project.as_str(),
            "stages": names,
        })) {
            println!("{json}");
        }
        return;
    }

    println!("{} ({} stages)", config.project, stages.len());
    for (index, stage) in stages.iter().enumerate() {
        println!("  {}. {}", index + 1, stage.describe());
    }
}
