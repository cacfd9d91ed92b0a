//! XP curves: conversion between total XP and level, and migration between curves.

pub mod curve;
pub mod expression;
pub mod migration;
pub mod types;

pub use curve::*;
pub use expression::XpExpression;
pub use migration::*;
pub use types::*;
