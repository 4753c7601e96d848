//! Pure computations backing the dashboard utilities. Nothing here touches
//! storage or the network.

pub mod calculator;
pub mod email_extractor;
pub mod password;
pub mod profitability;
pub mod word_counter;
