//! Homework Dashboard - 作业仪表盘后端服务
//!
//! 基于 Actix Web 构建，提供学生 CSV 导入、学生现况视图与会话门页面。
//!
//! # 架构
//! - `config`: 配置管理
//! - `errors`: 统一错误处理
//! - `middlewares`: 会话认证中间件
//! - `models`: 数据模型定义
//! - `routes`: 页面与 API 路由层
//! - `runtime`: 运行时生命周期管理
//! - `services`: 业务逻辑层
//! - `session`: 会话门与认证提供方
//! - `storage`: 键值存储适配层（local/memory/redis/noop）
//! - `utils`: 工具函数

pub mod config;
pub mod errors;
pub mod middlewares;
pub mod models;
pub mod routes;
pub mod runtime;
pub mod services;
pub mod session;
pub mod storage;
pub mod utils;
