//! 访客标识派生
//!
//! 把浏览器持有的原始访客令牌归一为稳定的不透明标识，
//! 仅用于投票去重，不用于任何个人识别。

use std::fmt;

use data_encoding::HEXLOWER;
use ring::digest;
use serde::{Deserialize, Serialize};

use crate::errors::{DomainError, DomainResult};

/// 访客稳定标识
///
/// 内容为原始令牌的 SHA-256 摘要（小写十六进制），
/// 同一令牌总是派生出同一标识。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VisitorId(String);

impl VisitorId {
    /// 从原始访客令牌派生标识
    pub fn derive(raw_token: &str) -> DomainResult<Self> {
        let raw = raw_token.trim();
        if raw.is_empty() {
            return Err(DomainError::invalid_argument("visitor_token", "不能为空"));
        }

        let digest = digest::digest(&digest::SHA256, raw.as_bytes());
        Ok(Self(HEXLOWER.encode(digest.as_ref())))
    }

    /// 从存储中恢复标识（值已是摘要形式）
    pub fn from_stored(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VisitorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
