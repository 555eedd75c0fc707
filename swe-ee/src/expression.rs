//! Earth Engine expression graph.
//!
//! An [`Expression`] is a flat table of named [`ValueNode`]s plus the key of
//! the node that produces the result. Function definitions refer to their
//! body by key, so a mapped function is described once and evaluated
//! remotely for every element of a collection.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// One node of the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ValueNode {
    ConstantValue(Value),
    ValueReference(String),
    ArgumentReference(String),
    FunctionInvocationValue(FunctionInvocation),
    FunctionDefinitionValue(FunctionDefinition),
    ArrayValue(ArrayValue),
    DictionaryValue(DictionaryValue),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionInvocation {
    pub function_name: String,
    pub arguments: BTreeMap<String, ValueNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionDefinition {
    pub argument_names: Vec<String>,
    /// Key of the body node in [`Expression::values`].
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrayValue {
    pub values: Vec<ValueNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DictionaryValue {
    pub values: BTreeMap<String, ValueNode>,
}

impl ValueNode {
    pub fn constant<V: Into<Value>>(value: V) -> ValueNode {
        ValueNode::ConstantValue(value.into())
    }

    pub fn null() -> ValueNode {
        ValueNode::ConstantValue(Value::Null)
    }

    pub fn argument(name: &str) -> ValueNode {
        ValueNode::ArgumentReference(name.to_string())
    }

    /// Invoke a named algorithm.
    pub fn invoke<I>(function_name: &str, arguments: I) -> ValueNode
    where
        I: IntoIterator<Item = (&'static str, ValueNode)>,
    {
        ValueNode::FunctionInvocationValue(FunctionInvocation {
            function_name: function_name.to_string(),
            arguments: arguments
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        })
    }

    /// Invoke an algorithm that takes no arguments.
    pub fn call(function_name: &str) -> ValueNode {
        ValueNode::FunctionInvocationValue(FunctionInvocation {
            function_name: function_name.to_string(),
            arguments: BTreeMap::new(),
        })
    }

    pub fn dictionary<I>(entries: I) -> ValueNode
    where
        I: IntoIterator<Item = (&'static str, ValueNode)>,
    {
        ValueNode::DictionaryValue(DictionaryValue {
            values: entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        })
    }

    /// Name of the invoked algorithm, if this node is an invocation.
    pub fn function_name(&self) -> Option<&str> {
        match self {
            ValueNode::FunctionInvocationValue(f) => Some(&f.function_name),
            _ => None,
        }
    }

    /// Argument of an invocation by name.
    pub fn argument_of(&self, name: &str) -> Option<&ValueNode> {
        match self {
            ValueNode::FunctionInvocationValue(f) => f.arguments.get(name),
            _ => None,
        }
    }
}

/// A complete computation, ready to be posted to `value:compute`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expression {
    pub values: BTreeMap<String, ValueNode>,
    pub result: String,
}

impl Expression {
    /// The node producing the result.
    pub fn result_node(&self) -> Option<&ValueNode> {
        self.values.get(&self.result)
    }

    /// Follow a value or function-body reference.
    pub fn resolve(&self, key: &str) -> Option<&ValueNode> {
        self.values.get(key)
    }
}

/// Collects named nodes and assigns their keys.
#[derive(Debug, Default)]
pub struct ExpressionBuilder {
    values: BTreeMap<String, ValueNode>,
}

impl ExpressionBuilder {
    pub fn new() -> ExpressionBuilder {
        ExpressionBuilder::default()
    }

    fn insert(&mut self, node: ValueNode) -> String {
        // "0" is reserved for the result
        let key = (self.values.len() + 1).to_string();
        self.values.insert(key.clone(), node);
        key
    }

    /// Define a function whose body is `body`.
    pub fn function(&mut self, argument_names: &[&str], body: ValueNode) -> ValueNode {
        let body = self.insert(body);
        ValueNode::FunctionDefinitionValue(FunctionDefinition {
            argument_names: argument_names.iter().map(|s| s.to_string()).collect(),
            body,
        })
    }

    pub fn build(mut self, result: ValueNode) -> Expression {
        self.values.insert("0".to_string(), result);
        Expression {
            values: self.values,
            result: "0".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_node_serialization_shape() {
        let node = ValueNode::invoke(
            "Image.select",
            [
                ("input", ValueNode::argument("img")),
                ("bandSelectors", ValueNode::constant(json!(["water"]))),
            ],
        );
        let value = serde_json::to_value(&node).unwrap();
        assert_eq!(
            value,
            json!({
                "functionInvocationValue": {
                    "functionName": "Image.select",
                    "arguments": {
                        "bandSelectors": {"constantValue": ["water"]},
                        "input": {"argumentReference": "img"}
                    }
                }
            })
        );
    }

    #[test]
    fn test_function_body_is_referenced_by_key() {
        let mut builder = ExpressionBuilder::new();
        let body = ValueNode::invoke("Image.date", [("image", ValueNode::argument("x"))]);
        let function = builder.function(&["x"], body.clone());
        let expression = builder.build(ValueNode::invoke(
            "Collection.map",
            [("baseAlgorithm", function)],
        ));

        let value = serde_json::to_value(&expression).unwrap();
        assert_eq!(value["result"], json!("0"));
        let definition = &value["values"]["0"]["functionInvocationValue"]["arguments"]
            ["baseAlgorithm"]["functionDefinitionValue"];
        assert_eq!(definition["argumentNames"], json!(["x"]));
        let body_key = definition["body"].as_str().unwrap();
        assert_eq!(expression.resolve(body_key), Some(&body));
    }

    #[test]
    fn test_null_constant() {
        let value = serde_json::to_value(ValueNode::null()).unwrap();
        assert_eq!(value, json!({"constantValue": null}));
    }

    #[test]
    fn test_deserialize_round_trip_of_dictionary() {
        let node = ValueNode::dictionary([("date", ValueNode::constant("2015-01-01"))]);
        let text = serde_json::to_string(&node).unwrap();
        let back: ValueNode = serde_json::from_str(&text).unwrap();
        assert_eq!(back, node);
    }
}
