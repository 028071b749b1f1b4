use std::fmt;

use actix_web::http::StatusCode;

#[derive(Debug, Clone)]
pub enum TuangouError {
    Validation(String),
    NotFound(String),
    Permission(String),
    StateConflict(String),
    DatabaseConfig(String),
    DatabaseConnection(String),
    DatabaseOperation(String),
    Notify(String),
}

impl TuangouError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            TuangouError::Validation(_) => "E001",
            TuangouError::NotFound(_) => "E002",
            TuangouError::Permission(_) => "E003",
            TuangouError::StateConflict(_) => "E004",
            TuangouError::DatabaseConfig(_) => "E005",
            TuangouError::DatabaseConnection(_) => "E006",
            TuangouError::DatabaseOperation(_) => "E007",
            TuangouError::Notify(_) => "E008",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            TuangouError::Validation(_) => "Validation Error",
            TuangouError::NotFound(_) => "Resource Not Found",
            TuangouError::Permission(_) => "Permission Denied",
            TuangouError::StateConflict(_) => "State Conflict",
            TuangouError::DatabaseConfig(_) => "Database Configuration Error",
            TuangouError::DatabaseConnection(_) => "Database Connection Error",
            TuangouError::DatabaseOperation(_) => "Database Operation Error",
            TuangouError::Notify(_) => "Notification Error",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            TuangouError::Validation(msg) => msg,
            TuangouError::NotFound(msg) => msg,
            TuangouError::Permission(msg) => msg,
            TuangouError::StateConflict(msg) => msg,
            TuangouError::DatabaseConfig(msg) => msg,
            TuangouError::DatabaseConnection(msg) => msg,
            TuangouError::DatabaseOperation(msg) => msg,
            TuangouError::Notify(msg) => msg,
        }
    }

    /// 映射为 HTTP 状态码
    pub fn http_status(&self) -> StatusCode {
        match self {
            TuangouError::Validation(_) => StatusCode::BAD_REQUEST,
            TuangouError::NotFound(_) => StatusCode::NOT_FOUND,
            TuangouError::Permission(_) => StatusCode::FORBIDDEN,
            TuangouError::StateConflict(_) => StatusCode::CONFLICT,
            TuangouError::DatabaseConfig(_)
            | TuangouError::DatabaseConnection(_)
            | TuangouError::DatabaseOperation(_)
            | TuangouError::Notify(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 格式化为简洁输出
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for TuangouError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for TuangouError {}

// 便捷的构造函数
impl TuangouError {
    pub fn validation<T: Into<String>>(msg: T) -> Self {
        TuangouError::Validation(msg.into())
    }

    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        TuangouError::NotFound(msg.into())
    }

    pub fn permission<T: Into<String>>(msg: T) -> Self {
        TuangouError::Permission(msg.into())
    }

    pub fn state_conflict<T: Into<String>>(msg: T) -> Self {
        TuangouError::StateConflict(msg.into())
    }

    pub fn database_config<T: Into<String>>(msg: T) -> Self {
        TuangouError::DatabaseConfig(msg.into())
    }

    pub fn database_connection<T: Into<String>>(msg: T) -> Self {
        TuangouError::DatabaseConnection(msg.into())
    }

    pub fn database_operation<T: Into<String>>(msg: T) -> Self {
        TuangouError::DatabaseOperation(msg.into())
    }

    pub fn notify<T: Into<String>>(msg: T) -> Self {
        TuangouError::Notify(msg.into())
    }
}

impl From<sea_orm::DbErr> for TuangouError {
    fn from(err: sea_orm::DbErr) -> Self {
        TuangouError::DatabaseOperation(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TuangouError>;
