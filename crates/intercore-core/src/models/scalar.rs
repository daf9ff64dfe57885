use serde::{Deserialize, Serialize};

use crate::rpc::envelope::TypedMessage;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntType {
    pub val: i64,
}

impl TypedMessage for IntType {
    const TYPE_NAME: &'static str = "intercore.IntType";
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrType {
    pub val: String,
}

impl TypedMessage for StrType {
    const TYPE_NAME: &'static str = "intercore.StrType";
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Empty {}

impl TypedMessage for Empty {
    const TYPE_NAME: &'static str = "intercore.Empty";
}
