//! Formatted output helpers for CLI commands.
//!
//! Renders backend-resolved values in `Fn::Sub` notation so a plan reads
//! as one line per property.

use checkerstack_stack::intrinsic::Value;

/// Renders a value as a substitution string, e.g. `https://${ApiGateway}`.
#[must_use]
pub fn format_value(value: &Value) -> String {
    match value {
        Value::Literal(s) | Value::Sub(s) => s.clone(),
        Value::Ref(target) => format!("${{{target}}}"),
        Value::GetAtt(id, attribute) => format!("${{{id}.{attribute}}}"),
        Value::Join(separator, parts) => parts
            .iter()
            .map(format_value)
            .collect::<Vec<_>>()
            .join(separator),
    }
}

/// Horizontal rule under a heading of the given width.
#[must_use]
pub fn rule(width: usize) -> String {
    "\u{2550}".repeat(width)
}

#[cfg(test)]
mod tests {
    use super::*;
    use checkerstack_common::types::LogicalId;

    fn id(s: &str) -> LogicalId {
        LogicalId::new(s).expect("valid id")
    }

    #[test]
    fn format_value_displays_literal() {
        assert_eq!(format_value(&Value::literal("essay")), "essay");
    }

    #[test]
    fn format_value_displays_ref() {
        assert_eq!(format_value(&Value::reference(&id("TaskQueue"))), "${TaskQueue}");
    }

    #[test]
    fn format_value_displays_get_att() {
        assert_eq!(
            format_value(&Value::get_att(&id("ApiHandler"), "Arn")),
            "${ApiHandler.Arn}"
        );
    }

    #[test]
    fn format_value_flattens_join() {
        let value = Value::concat(vec![
            Value::literal("https://"),
            Value::reference(&id("ApiGateway")),
            Value::literal(".execute-api."),
            Value::Ref("AWS::Region".into()),
        ]);
        assert_eq!(
            format_value(&value),
            "https://${ApiGateway}.execute-api.${AWS::Region}"
        );
    }

    #[test]
    fn rule_has_requested_width() {
        assert_eq!(rule(3).chars().count(), 3);
    }
}
