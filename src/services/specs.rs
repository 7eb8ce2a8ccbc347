//! Regex extraction of category-specific specs from listing titles.

use crate::domain::{
    Category, CoolerKind, CoolerSpecs, CpuSpecs, GpuSpecs, MotherboardSpecs, PsuSpecs, RamSpecs,
    Specs,
};
use once_cell::sync::Lazy;
use regex::Regex;

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap()
}

static GB: Lazy<Regex> = Lazy::new(|| re(r"(?i)\b(\d{1,3})\s?GB\b"));
static GPU_MEMORY: Lazy<Regex> = Lazy::new(|| re(r"(?i)\b(GDDR\d+X?|HBM\d?E?)\b"));
static GPU_CHIPSET: Lazy<Regex> = Lazy::new(|| {
    re(r"(?i)\b(?:(RTX|GTX)\s?(\d{4})((?:\s?(?:Ti|Super))*)|(RX)\s?(\d{4})((?:\s?(?:XTX|XT|GRE))?)|(Arc)\s?([AB]\d{3}))\b")
});

static SOCKET: Lazy<Regex> =
    Lazy::new(|| re(r"(?i)\b(AM[45]|LGA\s?-?\s?(\d{4})|sTRX4|sTR5|SP5)\b"));
static CORES: Lazy<Regex> = Lazy::new(|| re(r"(?i)\b(\d{1,3})[- ]?cores?\b"));
static THREADS: Lazy<Regex> = Lazy::new(|| re(r"(?i)\b(\d{1,3})[- ]?threads?\b"));
static CORES_THREADS: Lazy<Regex> = Lazy::new(|| re(r"(?i)\b(\d{1,3})C\s?/\s?(\d{1,3})T\b"));
static GHZ: Lazy<Regex> = Lazy::new(|| re(r"(?i)(up to\s*)?\b(\d{1,2}(?:\.\d{1,2})?)\s?GHz\b"));
static RYZEN_MODEL: Lazy<Regex> = Lazy::new(|| re(r"(?i)\bryzen\s?(?:\d|threadripper)?\s?(\d)\d{3}"));
static INTEL_CORE_MODEL: Lazy<Regex> = Lazy::new(|| re(r"(?i)\bi[3579][- ]?(\d{4,5})"));
static CORE_ULTRA_MODEL: Lazy<Regex> = Lazy::new(|| re(r"(?i)\bcore\s?ultra\s?[3579]\s?(\d)\d{2}"));

static RAM_KIT_PAREN: Lazy<Regex> =
    Lazy::new(|| re(r"(?i)\b(\d{1,3})\s?GB\s?\(\s?(\d)\s?x\s?(\d{1,3})\s?GB\s?\)"));
static RAM_KIT: Lazy<Regex> = Lazy::new(|| re(r"(?i)\b(\d)\s?x\s?(\d{1,3})\s?GB\b"));
static DDR: Lazy<Regex> = Lazy::new(|| re(r"(?i)\b(DDR[345])(?:-(\d{4}))?"));
static RAM_SPEED: Lazy<Regex> = Lazy::new(|| re(r"(?i)\b(\d{4})\s?(?:MHz|MT/s)"));
static CAS: Lazy<Regex> = Lazy::new(|| re(r"(?i)\bC(?:L)?\s?(\d{2})\b"));

static WATTAGE: Lazy<Regex> = Lazy::new(|| re(r"(?i)\b(\d{3,4})\s?(?:W|Watts?)\b"));
static CERTIFICATION: Lazy<Regex> = Lazy::new(|| {
    re(r"(?i)\b80\s?(?:PLUS|\+)(?:\s?(Titanium|Platinum|Gold|Silver|Bronze|White))?")
});
static MODULAR: Lazy<Regex> = Lazy::new(|| re(r"(?i)\b(non|semi|fully)[- ]?modular\b"));

static LIQUID: Lazy<Regex> =
    Lazy::new(|| re(r"(?i)\b(liquid|AIO|water|radiator|all[- ]in[- ]one)\b"));
static AIR: Lazy<Regex> = Lazy::new(|| re(r"(?i)\b(air|tower|heatsink|heat sink)\b"));
static RADIATOR: Lazy<Regex> = Lazy::new(|| re(r"(?i)\b(120|140|240|280|360|420)\s?mm\b"));

static BOARD_CHIPSET: Lazy<Regex> =
    Lazy::new(|| re(r"(?i)\b(TRX\d{2}|[ABHQWXZ]\d{3}E?)([MI])?\b"));
static FORM_FACTOR: Lazy<Regex> = Lazy::new(|| {
    re(r"(?i)\b(E-?ATX|Micro[- ]?ATX|mATX|uATX|Mini[- ]?ITX|mITX|ATX)\b")
});

pub fn extract_specs(category: Category, title: &str) -> Specs {
    match category {
        Category::Gpu => Specs::Gpu(gpu_specs(title)),
        Category::Cpu => Specs::Cpu(cpu_specs(title)),
        Category::Ram => Specs::Ram(ram_specs(title)),
        Category::Psu => Specs::Psu(psu_specs(title)),
        Category::Cooler => Specs::Cooler(cooler_specs(title)),
        Category::Motherboard => Specs::Motherboard(motherboard_specs(title)),
    }
}

fn capture_u32(regex: &Regex, text: &str, group: usize) -> Option<u32> {
    regex
        .captures(text)
        .and_then(|caps| caps.get(group))
        .and_then(|m| m.as_str().parse().ok())
}

fn title_case_suffix(suffix: &str) -> String {
    suffix
        .split_whitespace()
        .map(|word| match word.to_lowercase().as_str() {
            "ti" => "Ti".to_string(),
            "super" => "Super".to_string(),
            _ => word.to_uppercase(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn gpu_specs(title: &str) -> GpuSpecs {
    let chipset = GPU_CHIPSET.captures(title).map(|caps| {
        let (prefix, number, suffix) = if let Some(prefix) = caps.get(1) {
            (prefix.as_str().to_uppercase(), &caps[2], caps.get(3))
        } else if caps.get(4).is_some() {
            ("RX".to_string(), &caps[5], caps.get(6))
        } else {
            ("Arc".to_string(), &caps[8], None)
        };

        let suffix = suffix.map(|s| title_case_suffix(s.as_str())).unwrap_or_default();
        let number = number.to_uppercase();
        if suffix.is_empty() {
            format!("{} {}", prefix, number)
        } else {
            format!("{} {} {}", prefix, number, suffix)
        }
    });

    GpuSpecs {
        vram_gb: capture_u32(&GB, title, 1).filter(|gb| *gb <= 96),
        memory_type: GPU_MEMORY.captures(title).map(|c| c[1].to_uppercase()),
        chipset,
    }
}

fn normalize_socket(raw: &str) -> String {
    let upper = raw.to_uppercase();
    if upper.starts_with("LGA") {
        let digits: String = upper.chars().filter(|c| c.is_ascii_digit()).collect();
        format!("LGA{}", digits)
    } else if upper.starts_with("STR") {
        format!("sTR{}", &upper[3..])
    } else {
        upper
    }
}

/// Socket implied by a CPU model number when the title doesn't name one.
fn socket_from_cpu_model(title: &str) -> Option<String> {
    if let Some(series) = capture_u32(&RYZEN_MODEL, title, 1) {
        return match series {
            1..=5 => Some("AM4".to_string()),
            7..=9 => Some("AM5".to_string()),
            _ => None,
        };
    }

    if let Some(model) = capture_u32(&INTEL_CORE_MODEL, title, 1) {
        return match model / 1000 {
            10 | 11 => Some("LGA1200".to_string()),
            12..=14 => Some("LGA1700".to_string()),
            _ => None,
        };
    }

    match capture_u32(&CORE_ULTRA_MODEL, title, 1) {
        Some(2) => Some("LGA1851".to_string()),
        _ => None,
    }
}

fn cpu_specs(title: &str) -> CpuSpecs {
    let socket = SOCKET
        .captures(title)
        .map(|caps| normalize_socket(&caps[1]))
        .or_else(|| socket_from_cpu_model(title));

    let (mut cores, mut threads) = match CORES_THREADS.captures(title) {
        Some(caps) => (caps[1].parse().ok(), caps[2].parse().ok()),
        None => (None, None),
    };
    if cores.is_none() {
        cores = capture_u32(&CORES, title, 1);
    }
    if threads.is_none() {
        threads = capture_u32(&THREADS, title, 1);
    }

    let mut base_clock_ghz = None;
    let mut boost_clock_ghz = None;
    let clocks: Vec<(bool, f64)> = GHZ
        .captures_iter(title)
        .filter_map(|caps| {
            let up_to = caps.get(1).is_some();
            caps[2].parse::<f64>().ok().map(|ghz| (up_to, ghz))
        })
        .collect();

    match clocks.as_slice() {
        [] => {}
        [(true, ghz)] => boost_clock_ghz = Some(*ghz),
        [(false, ghz)] => base_clock_ghz = Some(*ghz),
        many => {
            let min = many.iter().map(|(_, g)| *g).fold(f64::INFINITY, f64::min);
            let max = many.iter().map(|(_, g)| *g).fold(f64::NEG_INFINITY, f64::max);
            base_clock_ghz = Some(min);
            if max > min {
                boost_clock_ghz = Some(max);
            }
        }
    }

    CpuSpecs {
        socket,
        cores,
        threads,
        base_clock_ghz,
        boost_clock_ghz,
    }
}

fn ram_specs(title: &str) -> RamSpecs {
    let (capacity_gb, modules) = if let Some(caps) = RAM_KIT_PAREN.captures(title) {
        (caps[1].parse().ok(), caps[2].parse().ok())
    } else if let Some(caps) = RAM_KIT.captures(title) {
        let modules: Option<u32> = caps[1].parse().ok();
        let per_module: Option<u32> = caps[2].parse().ok();
        (modules.zip(per_module).map(|(m, gb)| m * gb), modules)
    } else {
        (capture_u32(&GB, title, 1), None)
    };

    let ddr_caps = DDR.captures(title);
    let ddr = ddr_caps.as_ref().map(|c| c[1].to_uppercase());
    let speed_mts = ddr_caps
        .as_ref()
        .and_then(|c| c.get(2))
        .and_then(|m| m.as_str().parse().ok())
        .or_else(|| capture_u32(&RAM_SPEED, title, 1));

    RamSpecs {
        capacity_gb,
        modules,
        ddr,
        speed_mts,
        cas_latency: capture_u32(&CAS, title, 1),
    }
}

fn psu_specs(title: &str) -> PsuSpecs {
    let certification = CERTIFICATION.captures(title).map(|caps| match caps.get(1) {
        Some(tier) => {
            let tier = tier.as_str().to_lowercase();
            let mut chars = tier.chars();
            let tier = match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => tier,
            };
            format!("80 PLUS {}", tier)
        }
        None => "80 PLUS".to_string(),
    });

    let modular = MODULAR.captures(title).map(|caps| {
        match caps[1].to_lowercase().as_str() {
            "fully" => "Full",
            "semi" => "Semi",
            _ => "Non",
        }
        .to_string()
    });

    PsuSpecs {
        wattage: capture_u32(&WATTAGE, title, 1).filter(|w| (200..=3000).contains(w)),
        certification,
        modular,
    }
}

fn sockets_in(title: &str) -> Vec<String> {
    let mut sockets: Vec<String> = Vec::new();
    for caps in SOCKET.captures_iter(title) {
        let socket = normalize_socket(&caps[1]);
        if !sockets.contains(&socket) {
            sockets.push(socket);
        }
    }
    sockets
}

fn cooler_specs(title: &str) -> CoolerSpecs {
    let kind = if LIQUID.is_match(title) {
        Some(CoolerKind::Liquid)
    } else if AIR.is_match(title) {
        Some(CoolerKind::Air)
    } else {
        None
    };

    let radiator_mm = match kind {
        Some(CoolerKind::Liquid) => RADIATOR
            .captures_iter(title)
            .filter_map(|caps| caps[1].parse::<u32>().ok())
            .max(),
        _ => None,
    };

    CoolerSpecs {
        kind,
        radiator_mm,
        sockets: sockets_in(title),
    }
}

/// Socket implied by a desktop chipset name such as `B650` or `Z790`.
fn socket_from_chipset(chipset: &str) -> Option<String> {
    let mut chars = chipset.chars();
    let family = chars.next()?;
    let digits: String = chars.take_while(|c| c.is_ascii_digit()).collect();
    if digits.len() != 3 {
        return None;
    }
    let series = digits.chars().next()?.to_digit(10)?;

    let amd = match family {
        'A' | 'X' => true,
        'B' => digits.ends_with("50"),
        _ => false,
    };

    let socket = if amd {
        match series {
            3..=5 => "AM4",
            6 | 8 => "AM5",
            _ => return None,
        }
    } else {
        match series {
            4 | 5 => "LGA1200",
            6 | 7 => "LGA1700",
            8 => "LGA1851",
            _ => return None,
        }
    };
    Some(socket.to_string())
}

fn normalize_form_factor(raw: &str) -> String {
    let lower = raw.to_lowercase().replace([' ', '-'], "");
    match lower.as_str() {
        "eatx" => "E-ATX",
        "microatx" | "matx" | "uatx" => "Micro-ATX",
        "miniitx" | "mitx" => "Mini-ITX",
        _ => "ATX",
    }
    .to_string()
}

fn motherboard_specs(title: &str) -> MotherboardSpecs {
    let chipset_caps = BOARD_CHIPSET.captures(title);
    let chipset = chipset_caps.as_ref().map(|c| c[1].to_uppercase());
    let size_suffix = chipset_caps
        .as_ref()
        .and_then(|c| c.get(2))
        .map(|m| m.as_str().to_uppercase());

    let socket = SOCKET
        .captures(title)
        .map(|caps| normalize_socket(&caps[1]))
        .or_else(|| chipset.as_deref().and_then(socket_from_chipset));

    let form_factor = FORM_FACTOR
        .captures(title)
        .map(|caps| normalize_form_factor(&caps[1]))
        .or_else(|| match size_suffix.as_deref() {
            Some("M") => Some("Micro-ATX".to_string()),
            Some("I") => Some("Mini-ITX".to_string()),
            _ => None,
        });

    MotherboardSpecs {
        socket,
        chipset,
        form_factor,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gpu_specs() {
        let specs = gpu_specs("MSI Gaming GeForce RTX 4070 Ti Super 16GB GDDR6X 256-Bit");
        assert_eq!(specs.vram_gb, Some(16));
        assert_eq!(specs.memory_type.as_deref(), Some("GDDR6X"));
        assert_eq!(specs.chipset.as_deref(), Some("RTX 4070 Ti Super"));

        let specs = gpu_specs("Sapphire Pulse AMD Radeon RX 7900 XTX 24GB GDDR6");
        assert_eq!(specs.chipset.as_deref(), Some("RX 7900 XTX"));
        assert_eq!(specs.vram_gb, Some(24));

        let specs = gpu_specs("Intel Arc B580 Limited Edition 12 GB");
        assert_eq!(specs.chipset.as_deref(), Some("Arc B580"));
        assert_eq!(specs.vram_gb, Some(12));
        assert_eq!(specs.memory_type, None);
    }

    #[test]
    fn test_cpu_specs_explicit() {
        let specs = cpu_specs(
            "AMD Ryzen 7 7800X3D 8-Core, 16-Thread Desktop Processor, 4.2 GHz up to 5.0 GHz, Socket AM5",
        );
        assert_eq!(specs.socket.as_deref(), Some("AM5"));
        assert_eq!(specs.cores, Some(8));
        assert_eq!(specs.threads, Some(16));
        assert_eq!(specs.base_clock_ghz, Some(4.2));
        assert_eq!(specs.boost_clock_ghz, Some(5.0));
    }

    #[test]
    fn test_cpu_socket_inferred_from_model() {
        assert_eq!(
            cpu_specs("Intel Core i7-14700K Desktop Processor 20 cores up to 5.6 GHz").socket,
            Some("LGA1700".to_string())
        );
        assert_eq!(
            cpu_specs("AMD Ryzen 5 5600X 6-Core Processor").socket,
            Some("AM4".to_string())
        );
        assert_eq!(
            cpu_specs("Intel Core Ultra 9 285K").socket,
            Some("LGA1851".to_string())
        );
        assert_eq!(
            cpu_specs("Intel Core i5-10400 LGA 1200").socket,
            Some("LGA1200".to_string())
        );

        let specs = cpu_specs("Intel Core i9-13900K 24C/32T up to 5.8 GHz");
        assert_eq!(specs.cores, Some(24));
        assert_eq!(specs.threads, Some(32));
        assert_eq!(specs.boost_clock_ghz, Some(5.8));
        assert_eq!(specs.base_clock_ghz, None);
    }

    #[test]
    fn test_ram_specs() {
        let specs = ram_specs("G.SKILL Trident Z5 RGB DDR5-6000 32GB (2x16GB) CL30 Desktop Memory");
        assert_eq!(specs.capacity_gb, Some(32));
        assert_eq!(specs.modules, Some(2));
        assert_eq!(specs.ddr.as_deref(), Some("DDR5"));
        assert_eq!(specs.speed_mts, Some(6000));
        assert_eq!(specs.cas_latency, Some(30));

        let specs = ram_specs("Corsair Vengeance LPX 2 x 8GB DDR4 3200MHz C16");
        assert_eq!(specs.capacity_gb, Some(16));
        assert_eq!(specs.modules, Some(2));
        assert_eq!(specs.speed_mts, Some(3200));
        assert_eq!(specs.cas_latency, Some(16));
    }

    #[test]
    fn test_psu_specs() {
        let specs = psu_specs("Corsair RM850x Fully Modular 80 PLUS Gold 850W ATX Power Supply");
        assert_eq!(specs.wattage, Some(850));
        assert_eq!(specs.certification.as_deref(), Some("80 PLUS Gold"));
        assert_eq!(specs.modular.as_deref(), Some("Full"));

        let specs = psu_specs("EVGA 600 W1, 80+ WHITE 600W, 3 Year Warranty");
        assert_eq!(specs.wattage, Some(600));
        assert_eq!(specs.certification.as_deref(), Some("80 PLUS White"));
        assert_eq!(specs.modular, None);

        let specs = psu_specs("Thermaltake Smart 500 Watt Non-Modular 80+");
        assert_eq!(specs.wattage, Some(500));
        assert_eq!(specs.certification.as_deref(), Some("80 PLUS"));
        assert_eq!(specs.modular.as_deref(), Some("Non"));
    }

    #[test]
    fn test_cooler_specs() {
        let specs = cooler_specs("ARCTIC Liquid Freezer III 360 mm AIO CPU Water Cooler, AM5, LGA 1700");
        assert_eq!(specs.kind, Some(CoolerKind::Liquid));
        assert_eq!(specs.radiator_mm, Some(360));
        assert_eq!(specs.sockets, vec!["AM5", "LGA1700"]);

        let specs = cooler_specs("Noctua NH-D15 chromax.black, Dual-Tower CPU Cooler (140mm)");
        assert_eq!(specs.kind, Some(CoolerKind::Air));
        assert_eq!(specs.radiator_mm, None);
        assert!(specs.sockets.is_empty());
    }

    #[test]
    fn test_motherboard_specs() {
        let specs = motherboard_specs("MSI MAG B650 Tomahawk WiFi AM5 ATX Motherboard");
        assert_eq!(specs.chipset.as_deref(), Some("B650"));
        assert_eq!(specs.socket.as_deref(), Some("AM5"));
        assert_eq!(specs.form_factor.as_deref(), Some("ATX"));

        let specs = motherboard_specs("ASUS Prime B760M-A WiFi D4");
        assert_eq!(specs.chipset.as_deref(), Some("B760"));
        assert_eq!(specs.socket.as_deref(), Some("LGA1700"));
        assert_eq!(specs.form_factor.as_deref(), Some("Micro-ATX"));

        let specs = motherboard_specs("ASUS ROG Strix X870E-E Gaming WiFi E-ATX");
        assert_eq!(specs.chipset.as_deref(), Some("X870E"));
        assert_eq!(specs.socket.as_deref(), Some("AM5"));
        assert_eq!(specs.form_factor.as_deref(), Some("E-ATX"));

        let specs = motherboard_specs("Gigabyte B550I AORUS PRO AX Mini-ITX");
        assert_eq!(specs.socket.as_deref(), Some("AM4"));
        assert_eq!(specs.form_factor.as_deref(), Some("Mini-ITX"));
    }

    #[test]
    fn test_extract_specs_dispatch() {
        match extract_specs(Category::Psu, "be quiet! Pure Power 12 M 750W") {
            Specs::Psu(psu) => assert_eq!(psu.wattage, Some(750)),
            other => panic!("unexpected specs {:?}", other),
        }
    }
}
