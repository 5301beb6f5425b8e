// handlers/protected/mod.rs - Handlers that require an authenticated caller
//
// Route Prefix: /trpc/*
// Middleware: require_caller injects CallerContext into request extensions
pub mod key;
