//! RuleGraph development tools
//!
//! Hosts the HTTP dev server that lets the browser canvas editor talk to
//! a local project registry without a desktop shell.

pub mod dev_server;
