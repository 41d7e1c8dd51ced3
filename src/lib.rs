/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/10/26
******************************************************************************/

//! Client library for the social feed API.
//!
//! Every call goes through [`transport::http_client::SessionTransport`], which
//! attaches the current bearer credential and renews it at most once when the
//! server answers `401`. Like buttons are driven by
//! [`presentation::like_toggle::LikeToggle`], which flips the visible state
//! before the call resolves and reconciles it afterwards.

pub mod config;

pub mod constants;

pub mod error;

pub mod application;

pub mod presentation;

pub mod session;

pub mod storage;

pub mod transport;

pub mod utils;
