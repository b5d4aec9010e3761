use std::fmt;

use actix_web::http::StatusCode;

#[derive(Debug, Clone)]
pub enum VisitrackError {
    DatabaseConfig(String),
    DatabaseConnection(String),
    DatabaseOperation(String),
    Validation(String),
    NotFound(String),
    Serialization(String),
    Network(String),
    Config(String),
}

impl VisitrackError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            VisitrackError::DatabaseConfig(_) => "E001",
            VisitrackError::DatabaseConnection(_) => "E002",
            VisitrackError::DatabaseOperation(_) => "E003",
            VisitrackError::Validation(_) => "E004",
            VisitrackError::NotFound(_) => "E005",
            VisitrackError::Serialization(_) => "E006",
            VisitrackError::Network(_) => "E007",
            VisitrackError::Config(_) => "E008",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            VisitrackError::DatabaseConfig(_) => "Database Configuration Error",
            VisitrackError::DatabaseConnection(_) => "Database Connection Error",
            VisitrackError::DatabaseOperation(_) => "Database Operation Error",
            VisitrackError::Validation(_) => "Validation Error",
            VisitrackError::NotFound(_) => "Resource Not Found",
            VisitrackError::Serialization(_) => "Serialization Error",
            VisitrackError::Network(_) => "Network Error",
            VisitrackError::Config(_) => "Configuration Error",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            VisitrackError::DatabaseConfig(msg)
            | VisitrackError::DatabaseConnection(msg)
            | VisitrackError::DatabaseOperation(msg)
            | VisitrackError::Validation(msg)
            | VisitrackError::NotFound(msg)
            | VisitrackError::Serialization(msg)
            | VisitrackError::Network(msg)
            | VisitrackError::Config(msg) => msg,
        }
    }

    /// 映射到 HTTP 状态码
    pub fn http_status(&self) -> StatusCode {
        match self {
            VisitrackError::Validation(_) => StatusCode::BAD_REQUEST,
            VisitrackError::NotFound(_) => StatusCode::NOT_FOUND,
            VisitrackError::Network(_) | VisitrackError::DatabaseConnection(_) => {
                StatusCode::BAD_GATEWAY
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 格式化为彩色输出（用于 Server 模式）
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        format!(
            "{} {} {}\n  {}",
            "[ERROR]".red().bold(),
            self.code().yellow(),
            self.error_type().red(),
            self.message().white()
        )
    }

    /// 格式化为简洁输出
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for VisitrackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for VisitrackError {}

// 便捷的构造函数
impl VisitrackError {
    pub fn database_config<T: Into<String>>(msg: T) -> Self {
        VisitrackError::DatabaseConfig(msg.into())
    }

    pub fn database_connection<T: Into<String>>(msg: T) -> Self {
        VisitrackError::DatabaseConnection(msg.into())
    }

    pub fn database_operation<T: Into<String>>(msg: T) -> Self {
        VisitrackError::DatabaseOperation(msg.into())
    }

    pub fn validation<T: Into<String>>(msg: T) -> Self {
        VisitrackError::Validation(msg.into())
    }

    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        VisitrackError::NotFound(msg.into())
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        VisitrackError::Serialization(msg.into())
    }

    pub fn network<T: Into<String>>(msg: T) -> Self {
        VisitrackError::Network(msg.into())
    }

    pub fn config<T: Into<String>>(msg: T) -> Self {
        VisitrackError::Config(msg.into())
    }
}

impl From<sea_orm::DbErr> for VisitrackError {
    fn from(err: sea_orm::DbErr) -> Self {
        VisitrackError::DatabaseOperation(err.to_string())
    }
}

impl From<std::io::Error> for VisitrackError {
    fn from(err: std::io::Error) -> Self {
        VisitrackError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for VisitrackError {
    fn from(err: serde_json::Error) -> Self {
        VisitrackError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, VisitrackError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_unique() {
        let errors = [
            VisitrackError::database_config("a"),
            VisitrackError::database_connection("a"),
            VisitrackError::database_operation("a"),
            VisitrackError::validation("a"),
            VisitrackError::not_found("a"),
            VisitrackError::serialization("a"),
            VisitrackError::network("a"),
            VisitrackError::config("a"),
        ];
        let mut codes: Vec<&str> = errors.iter().map(|e| e.code()).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_format_simple() {
        let err = VisitrackError::validation("name is required");
        assert_eq!(err.to_string(), "Validation Error: name is required");
        assert_eq!(err.http_status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_network_maps_to_bad_gateway() {
        assert_eq!(
            VisitrackError::network("timeout").http_status(),
            StatusCode::BAD_GATEWAY
        );
    }
}
