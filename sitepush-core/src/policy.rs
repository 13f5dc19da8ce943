//! Bucket policy documents.

use serde::{Deserialize, Serialize};

use crate::types::BucketName;

pub const POLICY_VERSION: &str = "2012-10-17";

/// An IAM-style bucket policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BucketPolicy {
    pub version: String,
    pub statement: Vec<PolicyStatement>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyStatement {
    pub sid: String,
    pub effect: String,
    pub principal: String,
    pub action: String,
    pub resource: String,
}

impl BucketPolicy {
    /// Grant `s3:GetObject` on every object of `bucket` to everyone.
    pub fn public_read(bucket: &BucketName) -> Self {
        Self {
            version: POLICY_VERSION.to_string(),
            statement: vec![PolicyStatement {
                sid: "Web Site Access".to_string(),
                effect: "Allow".to_string(),
                principal: "*".to_string(),
                action: "s3:GetObject".to_string(),
                resource: format!("arn:aws:s3:::{bucket}/*"),
            }],
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
