// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `plan` command.

use std::fmt::Write as _;

use trap_opcua_listener::{ListenerConfig, MonitoringFilter, SubscriptionPlan};

use crate::cli::{Cli, OutputFormat, PlanArgs};
use crate::error::BinResult;

/// Executes the `plan` command.
pub fn plan(cli: &Cli, args: &PlanArgs) -> BinResult<()> {
    let (config, plan) = super::load_plan(&cli.config)?;
    println!("{}", render_plan(&config, &plan, args.format)?);
    Ok(())
}

/// Renders every data mapping and event item of a plan.
pub fn render_plan(
    config: &ListenerConfig,
    plan: &SubscriptionPlan,
    format: OutputFormat,
) -> BinResult<String> {
    match format {
        OutputFormat::Text => render_text(config, plan),
        OutputFormat::Json => render_json(config, plan),
    }
}

fn render_text(config: &ListenerConfig, plan: &SubscriptionPlan) -> BinResult<String> {
    let mut out = String::new();
    writeln!(out, "Subscription plan for {}", config.endpoint)?;
    writeln!(
        out,
        "  publishing interval {:?}, timestamp {:?}",
        config.subscription_interval, config.timestamp
    )?;

    writeln!(out)?;
    writeln!(out, "Data items ({}):", plan.data_requests.len())?;
    for (request, mapping) in plan.data_requests.iter().zip(plan.table.mappings()) {
        writeln!(out, "  {}", request)?;
        write!(out, "      {}.{}", mapping.measurement, mapping.field_name)?;
        if !mapping.tags.is_empty() {
            write!(out, "  [{}]", mapping.tag_string())?;
        }
        if let Some(MonitoringFilter::DataChange(filter)) = &request.parameters.filter {
            write!(
                out,
                "  filter {:?}/{:?} {}",
                filter.trigger, filter.deadband, filter.deadband_value
            )?;
        }
        writeln!(out)?;
    }

    writeln!(out)?;
    writeln!(out, "Event items ({}):", plan.event_requests.len())?;
    for (request, mapping) in plan.event_requests.iter().zip(&plan.event_mappings) {
        writeln!(out, "  {}", request)?;
        let sources = if mapping.source_names.is_empty() {
            "any".to_string()
        } else {
            mapping.source_names.join(", ")
        };
        writeln!(
            out,
            "      type {} ({}), fields: {}, sources: {}",
            mapping.event_type,
            mapping.event_type_encoding,
            mapping.fields.join(", "),
            sources
        )?;
    }

    Ok(out.trim_end().to_string())
}

fn render_json(config: &ListenerConfig, plan: &SubscriptionPlan) -> BinResult<String> {
    let data: Vec<serde_json::Value> = plan
        .data_requests
        .iter()
        .zip(plan.table.mappings())
        .map(|(request, mapping)| {
            serde_json::json!({
                "handle": request.client_handle(),
                "node_id": request.node_id.to_string(),
                "measurement": mapping.measurement,
                "field": mapping.field_name,
                "id": mapping.id,
                "tags": mapping.tags,
                "sampling_interval_ms": request.parameters.sampling_interval,
                "queue_size": request.parameters.queue_size,
                "discard_oldest": request.parameters.discard_oldest,
            })
        })
        .collect();

    let events: Vec<serde_json::Value> = plan
        .event_requests
        .iter()
        .zip(&plan.event_mappings)
        .map(|(request, mapping)| {
            serde_json::json!({
                "handle": request.client_handle(),
                "node_id": mapping.node_id.to_string(),
                "event_type": mapping.event_type.to_string(),
                "event_type_encoding": mapping.event_type_encoding.to_string(),
                "fields": mapping.fields,
                "source_names": mapping.source_names,
                "sampling_interval_ms": request.parameters.sampling_interval,
                "queue_size": request.parameters.queue_size,
            })
        })
        .collect();

    let output = serde_json::json!({
        "endpoint": config.endpoint,
        "data_items": data,
        "event_items": events,
    });
    Ok(serde_json::to_string_pretty(&output)?)
}
