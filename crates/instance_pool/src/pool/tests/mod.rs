//! Pool scenario tests against the reference scene host

mod scenarios;
