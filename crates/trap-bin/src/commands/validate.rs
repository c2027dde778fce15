// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `validate` command.

use std::fmt::Write as _;
use std::path::Path;

use trap_opcua_listener::{
    ConnectFailBehavior, DeadbandKind, ListenerConfig, MonitoringFilter, SubscriptionPlan,
};

use crate::cli::{Cli, OutputFormat, ValidateArgs};
use crate::error::{BinError, BinResult};

/// Executes the `validate` command.
pub fn validate(cli: &Cli, args: &ValidateArgs) -> BinResult<()> {
    let (config, plan) = super::load_plan(&cli.config)?;
    let warnings = collect_warnings(&config, &plan);

    println!(
        "{}",
        render_validation(&cli.config, &config, &plan, &warnings, args.format)?
    );

    if args.strict && !warnings.is_empty() {
        return Err(BinError::config(format!(
            "Strict mode: {} warning(s) found",
            warnings.len()
        )));
    }

    Ok(())
}

/// Collects non-fatal findings about a valid configuration.
pub fn collect_warnings(config: &ListenerConfig, plan: &SubscriptionPlan) -> Vec<String> {
    let mut warnings = Vec::new();

    if !plan.has_data() {
        warnings.push("No data points configured; only events will be streamed".to_string());
    }

    if config.connect_fail_behavior == ConnectFailBehavior::Ignore {
        warnings.push(
            "connect_fail_behavior is 'ignore'; a failed connect disables streaming for the run"
                .to_string(),
        );
    }

    for (request, mapping) in plan.data_requests.iter().zip(plan.table.mappings()) {
        if let Some(MonitoringFilter::DataChange(filter)) = &request.parameters.filter {
            if filter.deadband == DeadbandKind::Percent {
                warnings.push(format!(
                    "Point '{}' ({}) uses a percent deadband; the server needs an EURange for it",
                    mapping.field_name, mapping.id
                ));
            }
        }
    }

    warnings
}

/// Renders the validation summary.
pub fn render_validation(
    path: &Path,
    config: &ListenerConfig,
    plan: &SubscriptionPlan,
    warnings: &[String],
    format: OutputFormat,
) -> BinResult<String> {
    match format {
        OutputFormat::Text => {
            let mut out = String::new();
            writeln!(out, "✓ Configuration is valid: {}", path.display())?;
            writeln!(out)?;
            writeln!(out, "Summary:")?;
            writeln!(out, "  Endpoint: {}", config.endpoint)?;
            writeln!(out, "  Measurement: {}", config.name)?;
            writeln!(
                out,
                "  Subscription interval: {:?}",
                config.subscription_interval
            )?;
            writeln!(out, "  Connect failure: {}", config.connect_fail_behavior)?;
            writeln!(out, "  Data points: {}", plan.data_requests.len())?;
            writeln!(out, "  Event items: {}", plan.event_requests.len())?;

            if !warnings.is_empty() {
                writeln!(out)?;
                writeln!(out, "Warnings:")?;
                for warning in warnings {
                    writeln!(out, "  ⚠ {}", warning)?;
                }
            }

            Ok(out.trim_end().to_string())
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "valid": true,
                "config_path": path.display().to_string(),
                "summary": {
                    "endpoint": config.endpoint,
                    "measurement": config.name,
                    "subscription_interval_ms": config.subscription_interval.as_millis() as u64,
                    "connect_fail_behavior": config.connect_fail_behavior.to_string(),
                    "data_points": plan.data_requests.len(),
                    "event_items": plan.event_requests.len(),
                },
                "warnings": warnings,
            });
            Ok(serde_json::to_string_pretty(&output)?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use trap_opcua_listener::{
        ChangeFilterSettings, EventGroupDefinition, MonitoringParameters, NodeId,
        PointDefinition,
    };

    fn events_only() -> ListenerConfig {
        ListenerConfig::new("opc.tcp://localhost:4840").with_event_group(
            EventGroupDefinition::new(NodeId::numeric(0, 2041), Duration::from_secs(1))
                .with_node(NodeId::numeric(0, 2253))
                .with_field("Message"),
        )
    }

    #[test]
    fn test_warnings_for_events_only_ignore() {
        let config = events_only().with_connect_fail_behavior(ConnectFailBehavior::Ignore);
        let plan = SubscriptionPlan::from_config(&config).unwrap();

        let warnings = collect_warnings(&config, &plan);
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].contains("No data points"));
        assert!(warnings[1].contains("ignore"));
    }

    #[test]
    fn test_percent_deadband_warning() {
        let params = MonitoringParameters {
            data_change_filter: Some(ChangeFilterSettings::new("StatusValue", "Percent", Some(2.5))),
            ..Default::default()
        };
        let config = ListenerConfig::new("opc.tcp://localhost:4840")
            .with_node(PointDefinition::new("level", "2", "s", "Tank.Level").with_monitoring(params));
        let plan = SubscriptionPlan::from_config(&config).unwrap();

        let warnings = collect_warnings(&config, &plan);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("'level' (ns=2;s=Tank.Level)"));
    }

    #[test]
    fn test_render_text_lists_warnings() {
        let config = events_only();
        let plan = SubscriptionPlan::from_config(&config).unwrap();
        let warnings = collect_warnings(&config, &plan);

        let text = render_validation(
            Path::new("listener.toml"),
            &config,
            &plan,
            &warnings,
            OutputFormat::Text,
        )
        .unwrap();

        assert!(text.starts_with("✓ Configuration is valid: listener.toml"));
        assert!(text.contains("  Event items: 1"));
        assert!(text.ends_with("⚠ No data points configured; only events will be streamed"));
    }

    #[test]
    fn test_render_json() {
        let config = events_only();
        let plan = SubscriptionPlan::from_config(&config).unwrap();

        let text = render_validation(
            Path::new("listener.toml"),
            &config,
            &plan,
            &[],
            OutputFormat::Json,
        )
        .unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();

        assert_eq!(value["valid"], true);
        assert_eq!(value["summary"]["event_items"], 1);
        assert_eq!(value["summary"]["data_points"], 0);
        assert_eq!(value["summary"]["subscription_interval_ms"], 100);
    }
}
