// ==========================================
// 港口到港舱单系统 - 领域类型定义
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 用户角色 (Role)
// ==========================================
// 序列化格式: 小写 (与数据库/前端一致)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,     // 系统管理员
    Agen,      // 船务代理（上传舱单）
    Imigrasi,  // 移民局
    Pelabuhan, // 港务局
}

impl Role {
    /// 数据库存储字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Agen => "agen",
            Role::Imigrasi => "imigrasi",
            Role::Pelabuhan => "pelabuhan",
        }
    }

    /// 从字符串解析（大小写不敏感）
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "admin" => Some(Role::Admin),
            "agen" => Some(Role::Agen),
            "imigrasi" => Some(Role::Imigrasi),
            "pelabuhan" => Some(Role::Pelabuhan),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 性别 (Sex)
// ==========================================
// 舱单中的性别列写法不统一（M/F、MALE/FEMALE、L/P），统一为 M/F
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sex {
    M,
    F,
}

impl Sex {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_uppercase().as_str() {
            "M" | "MALE" | "L" | "LAKI-LAKI" | "LAKI LAKI" => Some(Sex::M),
            "F" | "FEMALE" | "P" | "PEREMPUAN" | "W" | "WANITA" => Some(Sex::F),
            _ => None,
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sex::M => write!(f, "M"),
            Sex::F => write!(f, "F"),
        }
    }
}
