//! 视频平台认证服务库
//! 会话与令牌生命周期：注册、登录、刷新轮换、登出、修改密码

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod repository;
pub mod routes;
pub mod services;
pub mod telemetry;
