use emabot_application::report::RunReport;

pub fn print_report(report: &RunReport) {
    println!("Starting Portfolio Value: {:.2}", report.starting_value());
    println!("Final Portfolio Value: {:.2}", report.final_value());

    let summary = &report.summary;
    println!("Sharpe Ratio: {:.4}", summary.sharpe);
    println!("Max Drawdown: {:.2}%", summary.max_drawdown * 100.0);
    println!("Return: {:.2}%", summary.total_return * 100.0);
    println!(
        "Trades: {} closed, {} fills, win rate {:.1}%",
        summary.closed_trades,
        summary.fills,
        summary.win_rate * 100.0
    );

    if let Some(quality) = &report.data_quality {
        if quality.duplicates > 0 || quality.out_of_order > 0 || quality.invalid_close > 0 {
            println!(
                "Data: rows={} duplicates={} out_of_order={} invalid_close={} gaps={}",
                quality.rows,
                quality.duplicates,
                quality.out_of_order,
                quality.invalid_close,
                quality.gaps
            );
        }
    }
    if let Some(run_dir) = &report.run_dir {
        println!("run output: {}", run_dir.display());
    }
    if report.canceled {
        println!("run canceled before the end of data");
    }
}
