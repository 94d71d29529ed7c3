//! `RenderNode` — the evaluator's output to the host UI (spec.md 6.2).

#[derive(Clone, Debug, PartialEq)]
pub enum RenderNode {
    PlainText {
        content: String,
    },
    Variable {
        name: String,
        raw_value: String,
        display_text: String,
    },
    MathResult {
        expression: String,
        result_display: String,
        display_text: String,
    },
    Combined {
        name: String,
        expression: String,
        result_display: String,
        display_text: String,
    },
    Error {
        kind: String,
        error: String,
        display_text: String,
    },
    PlotView {
        status: String,
        expression: String,
        target_line: usize,
    },
}

impl RenderNode {
    pub fn display_text(&self) -> &str {
        match self {
            RenderNode::PlainText { content } => content,
            RenderNode::Variable { display_text, .. } => display_text,
            RenderNode::MathResult { display_text, .. } => display_text,
            RenderNode::Combined { display_text, .. } => display_text,
            RenderNode::Error { display_text, .. } => display_text,
            RenderNode::PlotView { .. } => "",
        }
    }
}

/// Error prefix on display (spec.md 6.3): `⚠️ <message>`.
pub fn error_display(message: &str) -> String {
    format!("\u{26a0}\u{fe0f} {message}")
}
