use lens_form::{FAILURE_MESSAGE, SUCCESS_MESSAGE, SubmitReport};
use lens_spec::{FieldKind, RenderField, RenderPayload, RenderStatus, ValidationResult};

/// Controls which bits of state the wizard prints.
#[derive(Copy, Clone, Eq, PartialEq)]
pub enum Verbosity {
    /// Clean output: field prompts only.
    Clean,
    /// Verbose output: status, visible fields, and help text.
    Verbose,
}

impl Verbosity {
    pub fn from_verbose(verbose: bool) -> Self {
        if verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Clean
        }
    }

    pub fn is_verbose(&self) -> bool {
        matches!(self, Verbosity::Verbose)
    }
}

/// Prints prompts and outcomes for the interactive fill loop.
pub struct WizardPresenter {
    verbosity: Verbosity,
    header_printed: bool,
}

impl WizardPresenter {
    pub fn new(verbosity: Verbosity) -> Self {
        Self {
            verbosity,
            header_printed: false,
        }
    }

    pub fn show_header(&mut self, payload: &RenderPayload) {
        if self.header_printed {
            return;
        }
        println!("Form: {}", payload.form_title);
        if self.verbosity.is_verbose()
            && let Some(help) = &payload.help
        {
            println!("Help: {}", help);
        }
        self.header_printed = true;
    }

    pub fn show_status(&self, payload: &RenderPayload) {
        if !self.verbosity.is_verbose() {
            return;
        }
        println!(
            "Status: {} ({}/{})",
            payload.status.as_str(),
            payload.progress.answered,
            payload.progress.total
        );
        for field in &payload.fields {
            println!("  {:<8} {} ({})", field.activity.as_str(), field.name, field.label);
        }
    }

    pub fn show_prompt(&self, payload: &RenderPayload, field: &RenderField) {
        let index = (payload.progress.answered + 1).min(payload.progress.total.max(1));
        let mut line = format!("{}/{} {}", index, payload.progress.total, field.label);
        if field.required {
            line.push_str(" *");
        }
        if let Some(hint) = hint(field) {
            line.push(' ');
            line.push_str(&hint);
        }
        println!("{}", line);
        if let Some(error) = &field.error {
            eprintln!("  {}", error);
        }
    }

    pub fn show_completion(&self, payload: &RenderPayload) {
        if payload.status == RenderStatus::Complete {
            println!("All active fields are valid. Submitting...");
        }
    }

    pub fn show_report(&self, report: &SubmitReport) {
        match report {
            SubmitReport::Succeeded(_) => println!("{}", SUCCESS_MESSAGE),
            SubmitReport::Failed(failure) => {
                eprintln!("{}", FAILURE_MESSAGE);
                eprintln!("  Reason: {}", failure);
            }
            SubmitReport::Rejected(result) => print_errors(result),
            SubmitReport::AlreadySubmitting => eprintln!("A submission is already in flight."),
        }
    }
}

/// Prints one line per invalid field.
pub fn print_errors(result: &ValidationResult) {
    if result.is_valid() {
        return;
    }
    println!("Errors:");
    for (field, error) in &result.errors {
        println!("  {} - {}", field, error.message);
    }
}

/// Maps the yes/no spellings accepted at the prompt onto stored boolean values.
pub fn normalize_answer(kind: FieldKind, raw: &str) -> String {
    if kind != FieldKind::Boolean {
        return raw.to_string();
    }
    match raw.to_ascii_lowercase().as_str() {
        "y" | "yes" | "t" | "true" | "1" => "true".to_string(),
        "n" | "no" | "f" | "false" | "0" => "false".to_string(),
        _ => raw.to_string(),
    }
}

fn hint(field: &RenderField) -> Option<String> {
    match field.kind {
        FieldKind::Boolean => Some("(yes/no)".to_string()),
        FieldKind::Number => Some("(number)".to_string()),
        FieldKind::Enum => field
            .options
            .as_ref()
            .filter(|options| !options.is_empty())
            .map(|options| format!("({})", options.join("/"))),
        FieldKind::Text => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boolean_spellings_are_normalized() {
        assert_eq!(normalize_answer(FieldKind::Boolean, "Yes"), "true");
        assert_eq!(normalize_answer(FieldKind::Boolean, "n"), "false");
        assert_eq!(normalize_answer(FieldKind::Boolean, "maybe"), "maybe");
        assert_eq!(normalize_answer(FieldKind::Text, "yes"), "yes");
    }
}
