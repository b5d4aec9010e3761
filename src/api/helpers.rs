//! API 帮助函数

use actix_web::cookie::Cookie;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, HttpResponseBuilder};
use serde::Serialize;

use crate::errors::VisitrackError;

use super::error_code::ErrorCode;
use super::types::ApiResponse;

fn respond_with<T: Serialize>(
    mut builder: HttpResponseBuilder,
    code: ErrorCode,
    message: impl Into<String>,
    data: Option<T>,
    cookies: Vec<Cookie<'static>>,
) -> HttpResponse {
    for cookie in cookies {
        builder.cookie(cookie);
    }
    builder
        .append_header(("Content-Type", "application/json; charset=utf-8"))
        .append_header(("Cache-Control", "no-store"))
        .json(ApiResponse {
            code: code as i32,
            message: message.into(),
            data,
        })
}

/// 构建 JSON 响应
pub fn json_response<T: Serialize>(
    status: StatusCode,
    code: ErrorCode,
    message: impl Into<String>,
    data: Option<T>,
) -> HttpResponse {
    respond_with(HttpResponse::build(status), code, message, data, Vec::new())
}

/// 构建成功响应
pub fn success_response<T: Serialize>(data: T) -> HttpResponse {
    json_response(StatusCode::OK, ErrorCode::Success, "OK", Some(data))
}

/// 成功响应，同时下发本次请求写入的 cookie
pub fn success_with_cookies<T: Serialize>(data: T, cookies: Vec<Cookie<'static>>) -> HttpResponse {
    respond_with(
        HttpResponse::build(StatusCode::OK),
        ErrorCode::Success,
        "OK",
        Some(data),
        cookies,
    )
}

/// 构建错误响应
pub fn error_response(status: StatusCode, error_code: ErrorCode, message: &str) -> HttpResponse {
    json_response::<()>(status, error_code, message, None)
}

/// 从 VisitrackError 构建错误响应（自动映射 HTTP 状态码和 ErrorCode）
pub fn error_from_visitrack(err: &VisitrackError) -> HttpResponse {
    error_response(err.http_status(), ErrorCode::from(err), err.message())
}
