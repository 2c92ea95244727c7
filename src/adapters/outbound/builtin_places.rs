//! Built-in Place Table
//!
//! Major Chinese cities with a romanized alias, used when no search key is
//! configured or the search provider is down.

use crate::domain::entities::Place;
use crate::domain::ports::{MatchMode, PlaceDirectory};

struct Entry {
    name: &'static str,
    alias: &'static str,
    province: &'static str,
    lat: f64,
    lng: f64,
}

const fn entry(name: &'static str, alias: &'static str, province: &'static str, lat: f64, lng: f64) -> Entry {
    Entry {
        name,
        alias,
        province,
        lat,
        lng,
    }
}

const PLACES: &[Entry] = &[
    entry("北京", "Beijing", "北京市", 39.9042, 116.4074),
    entry("上海", "Shanghai", "上海市", 31.2304, 121.4737),
    entry("天津", "Tianjin", "天津市", 39.3434, 117.3616),
    entry("重庆", "Chongqing", "重庆市", 29.5630, 106.5516),
    entry("广州", "Guangzhou", "广东省", 23.1291, 113.2644),
    entry("深圳", "Shenzhen", "广东省", 22.5431, 114.0579),
    entry("杭州", "Hangzhou", "浙江省", 30.2741, 120.1551),
    entry("宁波", "Ningbo", "浙江省", 29.8683, 121.5440),
    entry("南京", "Nanjing", "江苏省", 32.0603, 118.7969),
    entry("苏州", "Suzhou", "江苏省", 31.2989, 120.5853),
    entry("成都", "Chengdu", "四川省", 30.5728, 104.0668),
    entry("武汉", "Wuhan", "湖北省", 30.5928, 114.3055),
    entry("西安", "Xi'an", "陕西省", 34.3416, 108.9398),
    entry("长沙", "Changsha", "湖南省", 28.2282, 112.9388),
    entry("郑州", "Zhengzhou", "河南省", 34.7466, 113.6254),
    entry("济南", "Jinan", "山东省", 36.6512, 117.1201),
    entry("青岛", "Qingdao", "山东省", 36.0671, 120.3826),
    entry("沈阳", "Shenyang", "辽宁省", 41.8057, 123.4315),
    entry("大连", "Dalian", "辽宁省", 38.9140, 121.6147),
    entry("哈尔滨", "Harbin", "黑龙江省", 45.8038, 126.5350),
    entry("长春", "Changchun", "吉林省", 43.8171, 125.3235),
    entry("石家庄", "Shijiazhuang", "河北省", 38.0428, 114.5149),
    entry("太原", "Taiyuan", "山西省", 37.8706, 112.5489),
    entry("合肥", "Hefei", "安徽省", 31.8206, 117.2272),
    entry("福州", "Fuzhou", "福建省", 26.0745, 119.2965),
    entry("厦门", "Xiamen", "福建省", 24.4798, 118.0894),
    entry("南昌", "Nanchang", "江西省", 28.6820, 115.8579),
    entry("昆明", "Kunming", "云南省", 25.0389, 102.7183),
    entry("贵阳", "Guiyang", "贵州省", 26.6470, 106.6302),
    entry("南宁", "Nanning", "广西壮族自治区", 22.8170, 108.3665),
    entry("海口", "Haikou", "海南省", 20.0440, 110.1999),
    entry("三亚", "Sanya", "海南省", 18.2528, 109.5119),
    entry("兰州", "Lanzhou", "甘肃省", 36.0611, 103.8343),
    entry("西宁", "Xining", "青海省", 36.6171, 101.7782),
    entry("银川", "Yinchuan", "宁夏回族自治区", 38.4872, 106.2309),
    entry("呼和浩特", "Hohhot", "内蒙古自治区", 40.8424, 111.7490),
    entry("乌鲁木齐", "Urumqi", "新疆维吾尔自治区", 43.8256, 87.6168),
    entry("拉萨", "Lhasa", "西藏自治区", 29.6520, 91.1721),
    entry("香港", "Hong Kong", "香港特别行政区", 22.3193, 114.1694),
    entry("澳门", "Macau", "澳门特别行政区", 22.1987, 113.5439),
    entry("台北", "Taipei", "台湾省", 25.0330, 121.5654),
];

/// [`PlaceDirectory`] over the compiled-in table.
#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinPlaces;

impl BuiltinPlaces {
    pub fn new() -> Self {
        Self
    }

    pub fn len(&self) -> usize {
        PLACES.len()
    }

    pub fn is_empty(&self) -> bool {
        PLACES.is_empty()
    }
}

impl Entry {
    fn matches(&self, query: &str, mode: MatchMode) -> bool {
        match mode {
            MatchMode::Exact => self.name.contains(query) || self.alias.contains(query),
            MatchMode::Relaxed => {
                let query = query.to_lowercase();
                self.name.to_lowercase().contains(&query)
                    || self.alias.to_lowercase().contains(&query)
            }
        }
    }

    fn to_place(&self) -> Place {
        let address = if self.province.starts_with(self.name) {
            self.province.to_string()
        } else {
            format!("{}{}市", self.province, self.name)
        };
        Place {
            lat: self.lat,
            lng: self.lng,
            name: self.name.to_string(),
            address,
        }
    }
}

impl PlaceDirectory for BuiltinPlaces {
    fn find(&self, query: &str, mode: MatchMode, limit: usize) -> Vec<Place> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }

        PLACES
            .iter()
            .filter(|e| e.matches(query, mode))
            .take(limit)
            .map(Entry::to_place)
            .collect()
    }
}
