use client_core::{ClassificationWorkflow, PreviewHandle, WorkflowState};
use shared::domain::{ImagePayload, Prediction};

pub fn format_confidence(prediction: &Prediction) -> String {
    format!("{:.2}%", prediction.confidence_percent())
}

fn describe_selection(image: &ImagePayload, preview: &PreviewHandle) -> String {
    let dimensions = preview
        .dimensions
        .map(|(w, h)| format!(", {w}x{h}"))
        .unwrap_or_default();
    format!(
        "Selected: {} ({}, {} bytes{dimensions})",
        image.filename,
        image.content_type,
        image.size_bytes()
    )
}

pub fn render_workflow(workflow: &ClassificationWorkflow) -> String {
    let state = workflow.state();
    let Some(selection) = state.selection() else {
        return "No image selected. Use `select <path>`.".to_string();
    };

    let mut lines = vec![describe_selection(selection.image(), selection.preview())];
    match state {
        WorkflowState::Idle => {}
        WorkflowState::Ready { .. } => {
            lines.push("Ready. Use `submit` to classify or `reset` to start over.".to_string())
        }
        WorkflowState::Submitting { .. } => lines.push("Processing...".to_string()),
        WorkflowState::Succeeded { result, .. } => {
            lines.push("Result:".to_string());
            lines.push(format!("  Prediction: {}", result.prediction));
            lines.push(format!("  Confidence: {}", format_confidence(result)));
        }
        WorkflowState::Failed { failure, .. } => lines.push(failure.message().to_string()),
    }
    lines.join("\n")
}

#[cfg(test)]
#[path = "tests/render_tests.rs"]
mod tests;
