/// Portfolio state after a bar has been processed, marked at that bar's close.
#[derive(Debug, Clone, PartialEq)]
pub struct EquityPoint {
    pub timestamp: i64,
    /// Cash plus positions at their latest marks.
    pub equity: f64,
    pub cash: f64,
    /// Units held across all symbols.
    pub position_qty: f64,
    pub unrealized_pnl: f64,
    pub realized_pnl: f64,
}
