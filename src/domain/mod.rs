// 領域層：規則、結果型別與規則查詢介面 (不做 I/O)

pub mod model;
pub mod ports;
