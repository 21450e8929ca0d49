//! Report rendering, kept apart from status detection

use super::node::{ClusterStatusReport, NodeStatus, ProcessState};
use std::fmt::Write;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to serialize report: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to format report")]
    Format(#[from] std::fmt::Error),
}

pub trait ReportRenderer {
    fn render(&self, report: &ClusterStatusReport) -> Result<String, RenderError>;
}

/// Human-readable blocks, one per host.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextRenderer;

impl TextRenderer {
    fn render_node(out: &mut String, node: &NodeStatus) -> std::fmt::Result {
        writeln!(out, "Server Status:")?;
        writeln!(
            out,
            "\t{}(IP: {}, Roles: {}): {}",
            node.label,
            node.ip.as_deref().unwrap_or("Unknown"),
            node.role,
            if node.process_running == ProcessState::Running {
                "Running"
            } else {
                "Not Running"
            }
        )?;

        if let Some(message) = &node.error_message {
            return writeln!(out, "\t{message}");
        }
        if let Some(presto) = &node.presto {
            writeln!(out, "\tNode URI(http): {}", presto.uri)?;
            writeln!(out, "\tPresto Version: {}", presto.version)?;
            writeln!(
                out,
                "\tNode is active: {}",
                if presto.active { "True" } else { "False" }
            )?;
            writeln!(out, "\tConnectors:     {}", presto.connectors.join(", "))?;
        }
        Ok(())
    }
}

impl ReportRenderer for TextRenderer {
    fn render(&self, report: &ClusterStatusReport) -> Result<String, RenderError> {
        let mut out = String::new();
        for node in &report.nodes {
            Self::render_node(&mut out, node)?;
        }
        Ok(out)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct JsonRenderer;

impl ReportRenderer for JsonRenderer {
    fn render(&self, report: &ClusterStatusReport) -> Result<String, RenderError> {
        Ok(serde_json::to_string_pretty(report)?)
    }
}
