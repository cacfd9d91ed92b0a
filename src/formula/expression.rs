//! User-defined XP curves evaluated at runtime.
//!
//! The expression is the XP floor of `level`. It may reference `level` and any
//! named constant from the config. Evaluation is sandboxed: the context only
//! holds numeric variables and pure math functions.

use crate::core::error::{LevelingError, Result};
use evalexpr::{
    build_operator_tree, ContextWithMutableFunctions, ContextWithMutableVariables,
    EvalexprResult, Function, HashMapContext, Node, Value,
};
use std::collections::BTreeMap;

/// Name of the variable bound to the level being evaluated.
pub const LEVEL_VARIABLE: &str = "level";

#[derive(Debug, Clone)]
pub struct XpExpression {
    text: String,
    tree: Node,
    constants: BTreeMap<String, f64>,
    max_level: u32,
}

impl XpExpression {
    /// Parse and validate an expression.
    ///
    /// Fails when the text is blank, `max_level` is 0, the syntax is invalid, or
    /// a probe evaluation at level 1 fails (typically an undefined variable).
    pub fn new(text: &str, constants: BTreeMap<String, f64>, max_level: u32) -> Result<Self> {
        let text = text.trim();
        if text.is_empty() {
            return Err(LevelingError::config("custom.xp_for_level must not be blank"));
        }
        if max_level < 1 {
            return Err(LevelingError::config("max_level must be >= 1"));
        }
        if constants.contains_key(LEVEL_VARIABLE) {
            return Err(LevelingError::config(
                "custom.constants must not redefine `level`",
            ));
        }

        let tree = build_operator_tree(text).map_err(|e| {
            LevelingError::config(format!("invalid custom expression `{}`: {}", text, e))
        })?;

        let expression = Self {
            text: text.to_string(),
            tree,
            constants,
            max_level,
        };
        expression.evaluate(1).map_err(|e| {
            LevelingError::config(format!("custom expression `{}` rejected: {}", text, e))
        })?;

        Ok(expression)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn constants(&self) -> &BTreeMap<String, f64> {
        &self.constants
    }

    pub fn max_level(&self) -> u32 {
        self.max_level
    }

    /// Raw (unrounded) value of the expression at `level`.
    pub fn evaluate(&self, level: u32) -> Result<f64> {
        let context = self
            .context_for(level)
            .map_err(|e| LevelingError::Evaluation(e.to_string()))?;
        self.tree
            .eval_number_with_context(&context)
            .map_err(|e| LevelingError::Evaluation(format!("`{}`: {}", self.text, e)))
    }

    fn context_for(&self, level: u32) -> EvalexprResult<HashMapContext> {
        let mut context = HashMapContext::new();
        register_math_functions(&mut context)?;
        context.set_value(LEVEL_VARIABLE.to_string(), Value::Float(level as f64))?;
        for (name, value) in &self.constants {
            context.set_value(name.clone(), Value::Float(*value))?;
        }
        Ok(context)
    }
}

/// Short aliases for the common math functions (`exp(x)` rather than `math::exp(x)`).
fn register_math_functions(context: &mut HashMapContext) -> EvalexprResult<()> {
    context.set_function(
        "exp".to_string(),
        Function::new(|arg| Ok(Value::Float(arg.as_number()?.exp()))),
    )?;
    context.set_function(
        "ln".to_string(),
        Function::new(|arg| Ok(Value::Float(arg.as_number()?.ln()))),
    )?;
    context.set_function(
        "log".to_string(),
        Function::new(|arg| Ok(Value::Float(arg.as_number()?.ln()))),
    )?;
    context.set_function(
        "sqrt".to_string(),
        Function::new(|arg| Ok(Value::Float(arg.as_number()?.sqrt()))),
    )?;
    context.set_function(
        "abs".to_string(),
        Function::new(|arg| Ok(Value::Float(arg.as_number()?.abs()))),
    )?;
    context.set_function(
        "pow".to_string(),
        Function::new(|arg| {
            let args = arg.as_fixed_len_tuple(2)?;
            Ok(Value::Float(args[0].as_number()?.powf(args[1].as_number()?)))
        }),
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constants(pairs: &[(&str, f64)]) -> BTreeMap<String, f64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_level_is_bound() {
        let expr = XpExpression::new("100 * level", BTreeMap::new(), 10).unwrap();
        assert_eq!(expr.evaluate(3).unwrap(), 300.0);
    }

    #[test]
    fn test_constants_are_bound() {
        let expr =
            XpExpression::new("a * level + b", constants(&[("a", 2.0), ("b", 5.0)]), 10).unwrap();
        assert_eq!(expr.evaluate(4).unwrap(), 13.0);
    }

    #[test]
    fn test_level_division_is_not_integer_division() {
        let expr = XpExpression::new("level / 2", BTreeMap::new(), 10).unwrap();
        assert_eq!(expr.evaluate(3).unwrap(), 1.5);
    }

    #[test]
    fn test_default_config_expression_evaluates() {
        let expr = XpExpression::new(
            "exp(a * (level - 1)) * b / c",
            constants(&[("a", 0.12), ("b", 100.0), ("c", 1.0)]),
            100,
        )
        .unwrap();
        assert!((expr.evaluate(1).unwrap() - 100.0).abs() < 1e-9);
        assert!(expr.evaluate(2).unwrap() > 100.0);
    }

    #[test]
    fn test_pow_function() {
        let expr = XpExpression::new("pow(level, 2)", BTreeMap::new(), 10).unwrap();
        assert_eq!(expr.evaluate(3).unwrap(), 9.0);
    }

    #[test]
    fn test_blank_expression_rejected() {
        let err = XpExpression::new("   ", BTreeMap::new(), 10).unwrap_err();
        assert!(matches!(err, LevelingError::Config(_)));
    }

    #[test]
    fn test_zero_max_level_rejected() {
        let err = XpExpression::new("level", BTreeMap::new(), 0).unwrap_err();
        assert!(matches!(err, LevelingError::Config(_)));
    }

    #[test]
    fn test_undefined_variable_rejected_at_construction() {
        let err = XpExpression::new("level * missing", BTreeMap::new(), 10).unwrap_err();
        assert!(matches!(err, LevelingError::Config(_)));
    }

    #[test]
    fn test_syntax_error_rejected_at_construction() {
        let err = XpExpression::new("level * (2 +", BTreeMap::new(), 10).unwrap_err();
        assert!(matches!(err, LevelingError::Config(_)));
    }

    #[test]
    fn test_text_is_trimmed() {
        let expr = XpExpression::new("  level  ", BTreeMap::new(), 10).unwrap();
        assert_eq!(expr.text(), "level");
    }
}
