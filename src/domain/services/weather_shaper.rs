//! Weather Shaper
//!
//! Pure mapping from the provider's raw forecast bundle to [`WeatherReport`].

use crate::domain::entities::{
    CurrentConditions, DailyForecast, HourlyPoint, LifeIndex, WeatherInfo, WeatherReport,
};
use chrono::{DateTime, Datelike, Days, TimeDelta, Timelike, Utc, Weekday};
use serde_json::{json, Value};

/// Hourly points kept from the bundle.
const MAX_HOURLY: usize = 24;
/// Days kept from the bundle.
const MAX_DAILY: usize = 3;
const DEFAULT_SKYCON: &str = "CLEAR_DAY";

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ShapeError {
    #[error("weather payload missing {0}")]
    MissingField(&'static str),
}

/// Map a sky condition code to an icon and a description.
pub fn skycon_info(code: &str) -> WeatherInfo {
    let (icon, desc) = match code {
        "CLEAR_DAY" => ("☀️", "晴"),
        "CLEAR_NIGHT" => ("🌙", "晴（夜间）"),
        "PARTLY_CLOUDY_DAY" => ("⛅", "多云"),
        // Stacked moon + cloud, rendered as HTML by the front end
        "PARTLY_CLOUDY_NIGHT" => (
            "<span class=\"icon-stacked\"><span class=\"i-back\">🌙</span><span class=\"i-front\">☁️</span></span>",
            "多云（夜间）",
        ),
        "CLOUDY" => ("☁️", "阴"),
        "LIGHT_RAIN" => ("🌧️", "小雨"),
        "MODERATE_RAIN" => ("🌧️", "中雨"),
        "HEAVY_RAIN" => ("⛈️", "大雨"),
        "STORM_RAIN" => ("⛈️", "暴雨"),
        "HAIL" => ("🌨️", "冰雹"),
        "SLEET" => ("🌨️", "雨夹雪"),
        "LIGHT_SNOW" => ("🌨️", "小雪"),
        "MODERATE_SNOW" => ("🌨️", "中雪"),
        "HEAVY_SNOW" => ("❄️", "大雪"),
        "STORM_SNOW" => ("❄️", "暴雪"),
        "FOG" => ("🌫️", "雾"),
        "LIGHT_HAZE" => ("🌫️", "轻度霾"),
        "MODERATE_HAZE" => ("🌫️", "中度霾"),
        "HEAVY_HAZE" => ("🌫️", "重度霾"),
        "DUST" => ("🌪️", "浮尘"),
        "SAND" => ("🌪️", "沙尘"),
        "WIND" => ("🌬️", "大风"),
        other => ("?", other),
    };
    WeatherInfo {
        icon: icon.to_string(),
        desc: desc.to_string(),
    }
}

/// Shape a raw provider bundle.
///
/// `longitude` drives the local-hour offset (`round(lng / 15)` hours), which
/// is used both for hourly labels and for the relative day names.
pub fn shape(raw: &Value, longitude: f64, now: DateTime<Utc>) -> Result<WeatherReport, ShapeError> {
    let result = raw.get("result").ok_or(ShapeError::MissingField("result"))?;
    let realtime = result
        .get("realtime")
        .ok_or(ShapeError::MissingField("realtime"))?;

    let offset_hours = (longitude / 15.0).round() as i64;
    let local_now = now + TimeDelta::hours(offset_hours);

    Ok(WeatherReport {
        current: shape_current(realtime),
        hourly: shape_hourly(result.get("hourly").unwrap_or(&Value::Null), local_now.hour()),
        daily: shape_daily(result.get("daily").unwrap_or(&Value::Null), local_now),
        forecast_keypoint: result
            .get("forecast_keypoint")
            .cloned()
            .unwrap_or_else(|| Value::String("天气提示".to_string())),
        synthetic: false,
    })
}

fn shape_current(realtime: &Value) -> CurrentConditions {
    let skycon = realtime
        .get("skycon")
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_SKYCON);

    CurrentConditions {
        temperature: rounded(realtime.get("temperature")),
        apparent_temperature: rounded(realtime.get("apparent_temperature")),
        humidity: (number_at(realtime, &["humidity"]).unwrap_or(0.0) * 100.0).round() as i64,
        // m/s -> km/h
        wind_speed: (number_at(realtime, &["wind", "speed"]).unwrap_or(0.0) * 3.6).round() as i64,
        wind_direction: number_at(realtime, &["wind", "direction"]).unwrap_or(0.0) as i64,
        // Pa -> hPa
        pressure: (number_at(realtime, &["pressure"]).unwrap_or(101_325.0) / 100.0).round() as i64,
        visibility: realtime.get("visibility").cloned().unwrap_or(Value::Null),
        skycon: skycon.to_string(),
        weather_info: skycon_info(skycon),
        air_quality: realtime.get("air_quality").cloned().unwrap_or(Value::Null),
    }
}

fn shape_hourly(hourly: &Value, local_hour: u32) -> Vec<HourlyPoint> {
    let temps = array_at(hourly, "temperature");
    let skies = array_at(hourly, "skycon");
    let count = temps.len().min(skies.len()).min(MAX_HOURLY);

    (0..count)
        .map(|i| {
            let skycon = skies[i]
                .get("value")
                .and_then(Value::as_str)
                .unwrap_or(DEFAULT_SKYCON);
            HourlyPoint {
                time: (local_hour + i as u32) % 24,
                temperature: rounded(temps[i].get("value")),
                skycon: skycon.to_string(),
                weather_info: skycon_info(skycon),
            }
        })
        .collect()
}

fn shape_daily(daily: &Value, local_now: DateTime<Utc>) -> Vec<DailyForecast> {
    let temps = array_at(daily, "temperature");
    let skies = array_at(daily, "skycon");
    let life = daily.get("life_index").unwrap_or(&Value::Null);
    let today = local_now.date_naive();

    temps
        .iter()
        .take(MAX_DAILY)
        .enumerate()
        .map(|(i, temp)| {
            let date = today.checked_add_days(Days::new(i as u64)).unwrap_or(today);
            let skycon = skies
                .get(i)
                .and_then(|s| s.get("value"))
                .and_then(Value::as_str)
                .unwrap_or(DEFAULT_SKYCON);
            let index = |key: &str| -> Value {
                life.get(key)
                    .and_then(Value::as_array)
                    .and_then(|entries| entries.get(i))
                    .cloned()
                    .unwrap_or_else(|| json!({"index": "", "desc": ""}))
            };

            DailyForecast {
                date: format!("{:02}-{:02}", date.month(), date.day()),
                weekday: weekday_label(date.weekday()).to_string(),
                relative_day: relative_day_label(i).to_string(),
                max_temp: rounded(temp.get("max")),
                min_temp: rounded(temp.get("min")),
                skycon: skycon.to_string(),
                weather_info: skycon_info(skycon),
                life_index: LifeIndex {
                    ultraviolet: index("ultraviolet"),
                    car_washing: index("carWashing"),
                    dressing: index("dressing"),
                    comfort: index("comfort"),
                    cold_risk: index("coldRisk"),
                },
            }
        })
        .collect()
}

/// Fixed illustrative report served when no provider token is configured.
pub fn synthetic_report() -> WeatherReport {
    let rain = "MODERATE_RAIN";
    WeatherReport {
        current: CurrentConditions {
            temperature: 26,
            apparent_temperature: 30,
            humidity: 87,
            wind_speed: 28,
            wind_direction: 0,
            pressure: 1007,
            visibility: json!(5.26),
            skycon: rain.to_string(),
            weather_info: skycon_info(rain),
            air_quality: json!({
                "aqi": {"chn": 14},
                "description": {"chn": "优"},
                "pm25": 9,
                "pm10": 14,
                "o3": 19
            }),
        },
        hourly: (0..MAX_HOURLY as u32)
            .map(|hour| HourlyPoint {
                time: hour,
                temperature: 26,
                skycon: rain.to_string(),
                weather_info: skycon_info(rain),
            })
            .collect(),
        daily: vec![DailyForecast {
            date: "今日".to_string(),
            weekday: "周几".to_string(),
            relative_day: relative_day_label(0).to_string(),
            max_temp: 29,
            min_temp: 24,
            skycon: rain.to_string(),
            weather_info: skycon_info(rain),
            life_index: LifeIndex {
                ultraviolet: json!({"index": "中", "desc": "注意防晒"}),
                car_washing: json!({"index": "", "desc": ""}),
                dressing: json!({"index": "", "desc": ""}),
                comfort: json!({"index": "", "desc": ""}),
                cold_risk: json!({"index": "", "desc": ""}),
            },
        }],
        forecast_keypoint: json!("注意携带雨具"),
        synthetic: true,
    }
}

fn weekday_label(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "周一",
        Weekday::Tue => "周二",
        Weekday::Wed => "周三",
        Weekday::Thu => "周四",
        Weekday::Fri => "周五",
        Weekday::Sat => "周六",
        Weekday::Sun => "周日",
    }
}

fn relative_day_label(offset: usize) -> &'static str {
    match offset {
        0 => "今天",
        1 => "明天",
        2 => "后天",
        _ => "",
    }
}

fn rounded(v: Option<&Value>) -> i64 {
    v.and_then(Value::as_f64).map(|n| n.round() as i64).unwrap_or(0)
}

fn number_at(v: &Value, path: &[&str]) -> Option<f64> {
    path.iter().try_fold(v, |cur, key| cur.get(key))?.as_f64()
}

fn array_at<'a>(v: &'a Value, key: &str) -> &'a [Value] {
    v.get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_payload() -> Value {
        json!({
            "status": "ok",
            "result": {
                "realtime": {
                    "temperature": 21.6,
                    "apparent_temperature": 20.4,
                    "humidity": 0.53,
                    "wind": {"speed": 5.0, "direction": 135.7},
                    "pressure": 101_220.0,
                    "visibility": 10.2,
                    "skycon": "CLOUDY",
                    "air_quality": {"aqi": {"chn": 40}}
                },
                "hourly": {
                    "temperature": [{"value": 21.4}, {"value": 20.6}, {"value": 19.5}],
                    "skycon": [{"value": "CLOUDY"}, {"value": "LIGHT_RAIN"}, {"value": "CLEAR_NIGHT"}]
                },
                "daily": {
                    "temperature": [
                        {"max": 25.5, "min": 15.2},
                        {"max": 23.1, "min": 14.8},
                        {"max": 22.0, "min": 13.0},
                        {"max": 30.0, "min": 20.0}
                    ],
                    "skycon": [{"value": "CLOUDY"}, {"value": "LIGHT_RAIN"}],
                    "life_index": {
                        "ultraviolet": [{"index": "2", "desc": "弱"}]
                    }
                },
                "forecast_keypoint": "今天阴，明天有小雨"
            }
        })
    }

    fn noon_utc() -> DateTime<Utc> {
        // 2026-01-05 is a Monday.
        Utc.with_ymd_and_hms(2026, 1, 5, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_current_unit_conversions() {
        let report = shape(&sample_payload(), 116.4, noon_utc()).unwrap();
        let current = report.current;

        assert_eq!(current.temperature, 22);
        assert_eq!(current.apparent_temperature, 20);
        assert_eq!(current.humidity, 53);
        assert_eq!(current.wind_speed, 18);
        assert_eq!(current.wind_direction, 135);
        assert_eq!(current.pressure, 1012);
        assert_eq!(current.skycon, "CLOUDY");
        assert_eq!(current.weather_info.desc, "阴");
        assert!(!report.synthetic);
    }

    #[test]
    fn test_missing_realtime_is_an_error() {
        let raw = json!({"status": "ok", "result": {}});
        assert_eq!(
            shape(&raw, 0.0, noon_utc()).unwrap_err(),
            ShapeError::MissingField("realtime")
        );

        let raw = json!({"status": "ok"});
        assert_eq!(
            shape(&raw, 0.0, noon_utc()).unwrap_err(),
            ShapeError::MissingField("result")
        );
    }

    #[test]
    fn test_missing_pressure_uses_standard_atmosphere() {
        let raw = json!({"result": {"realtime": {}}});
        let report = shape(&raw, 0.0, noon_utc()).unwrap();
        assert_eq!(report.current.pressure, 1013);
        assert_eq!(report.current.skycon, "CLEAR_DAY");
        assert!(report.hourly.is_empty());
        assert!(report.daily.is_empty());
        assert_eq!(report.forecast_keypoint, json!("天气提示"));
    }

    #[test]
    fn test_hourly_aligned_to_local_hour() {
        // 116.4 / 15 rounds to +8 hours: 12:00 UTC is 20:00 local.
        let report = shape(&sample_payload(), 116.4, noon_utc()).unwrap();
        let hours: Vec<u32> = report.hourly.iter().map(|h| h.time).collect();
        assert_eq!(hours, vec![20, 21, 22]);
        assert_eq!(report.hourly[1].skycon, "LIGHT_RAIN");
        assert_eq!(report.hourly[0].temperature, 21);
    }

    #[test]
    fn test_hourly_wraps_past_midnight() {
        let late = Utc.with_ymd_and_hms(2026, 1, 5, 15, 0, 0).unwrap();
        let report = shape(&sample_payload(), 120.0, late).unwrap();
        let hours: Vec<u32> = report.hourly.iter().map(|h| h.time).collect();
        assert_eq!(hours, vec![23, 0, 1]);
    }

    #[test]
    fn test_negative_longitude_offsets_backwards() {
        let report = shape(&sample_payload(), -75.0, noon_utc()).unwrap();
        assert_eq!(report.hourly[0].time, 7);
    }

    #[test]
    fn test_daily_labels_and_limit() {
        let report = shape(&sample_payload(), 116.4, noon_utc()).unwrap();
        assert_eq!(report.daily.len(), 3);

        let labels: Vec<&str> = report.daily.iter().map(|d| d.relative_day.as_str()).collect();
        assert_eq!(labels, vec!["今天", "明天", "后天"]);

        assert_eq!(report.daily[0].date, "01-05");
        assert_eq!(report.daily[0].weekday, "周一");
        assert_eq!(report.daily[1].weekday, "周二");
        assert_eq!(report.daily[0].max_temp, 26);
        assert_eq!(report.daily[0].min_temp, 15);
        // Missing skycon entries default to clear.
        assert_eq!(report.daily[2].skycon, "CLEAR_DAY");
    }

    #[test]
    fn test_daily_date_uses_local_day() {
        // 20:00 UTC at +8 is already the next day locally.
        let evening = Utc.with_ymd_and_hms(2026, 1, 5, 20, 0, 0).unwrap();
        let report = shape(&sample_payload(), 116.4, evening).unwrap();
        assert_eq!(report.daily[0].date, "01-06");
        assert_eq!(report.daily[0].weekday, "周二");
    }

    #[test]
    fn test_life_index_defaults() {
        let report = shape(&sample_payload(), 116.4, noon_utc()).unwrap();
        assert_eq!(
            report.daily[0].life_index.ultraviolet,
            json!({"index": "2", "desc": "弱"})
        );
        assert_eq!(
            report.daily[1].life_index.ultraviolet,
            json!({"index": "", "desc": ""})
        );
        assert_eq!(
            report.daily[0].life_index.cold_risk,
            json!({"index": "", "desc": ""})
        );
    }

    #[test]
    fn test_unknown_skycon_passes_code_through() {
        let info = skycon_info("VOLCANIC_ASH");
        assert_eq!(info.icon, "?");
        assert_eq!(info.desc, "VOLCANIC_ASH");
    }

    #[test]
    fn test_synthetic_report_is_marked() {
        let report = synthetic_report();
        assert!(report.synthetic);
        assert_eq!(report.hourly.len(), 24);
        assert_eq!(report.current.skycon, "MODERATE_RAIN");
        assert_eq!(report.daily[0].relative_day, "今天");
    }
}
