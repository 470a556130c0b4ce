mod activity;
mod debate;
mod lenient;
mod market;
mod poll_result;
mod ring_log;
mod scan;

pub use {
    activity::{LogEntry, LogStatus, Thought, ThoughtKind},
    debate::{
        DebateHistory, DebateMessage, DebateResult, QuickAnalysis, QuickAnalysisResponse,
        TopPick, TopPicks,
    },
    market::{
        AutomationStatus, Balance, BalanceSheet, CASH_CURRENCY, MarketPrices, Position,
        PositionsSnapshot, Quote, Signal, TradeFeed, TradeRecord,
    },
    poll_result::{PollResult, mark_failed},
    ring_log::RingLog,
    scan::{
        BoughtItem, BuyScanResponse, Candidate, ScanOutcome, ScanResponse, ScanSide,
        SellScanResponse, SoldItem, strip_market,
    },
};
