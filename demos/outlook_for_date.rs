use chrono::{Duration, Local};
use power_outlook::{Coordinate, OutlookError, PowerOutlook, Variable};
use serde_json::to_string_pretty;
use std::collections::BTreeMap;

#[tokio::main]
async fn main() -> Result<(), OutlookError> {
    let client = PowerOutlook::new().await?;
    let date = Local::now().date_naive() + Duration::days(45);

    let response = client
        .outlook()
        .date(date)
        .location(Coordinate::new(13.404954, 52.520008))
        .thresholds(BTreeMap::from([
            (Variable::Temperature, 25.0),
            (Variable::Precipitation, 1.0),
            (Variable::WindSpeed, 6.0),
        ]))
        .call()
        .await?;

    let json = to_string_pretty(&response).unwrap();
    println!("{}", json);

    let csv = client
        .history_csv()
        .date(date)
        .location(Coordinate::new(13.404954, 52.520008))
        .variables(&[Variable::Temperature, Variable::Precipitation])
        .call()
        .await?;
    println!("{}", csv);
    Ok(())
}
