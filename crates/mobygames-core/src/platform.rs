//! Platform translation between launcher platforms and MobyGames codes
//!
//! Launcher platforms are identified by a long name ("Nintendo NES") and a
//! compact name ("nes"). Some platforms are aliases of another one and
//! borrow its MobyGames code when they have none of their own.

use std::collections::HashMap;
use std::sync::OnceLock;

/// MobyGames code meaning "no platform filter"
///
/// MobyGames rejects both `platform=0` and `platform=` so this value is
/// never sent; the search URL builder omits the parameter instead.
pub const UNKNOWN_PLATFORM_CODE: u32 = 0;

pub const PLATFORM_UNKNOWN_COMPACT: &str = "unknown";
pub const PLATFORM_MAME_COMPACT: &str = "mame";

/// A launcher platform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Platform {
    pub long_name: &'static str,
    pub compact_name: &'static str,
    pub alias_of: Option<&'static str>,
}

const fn p(long_name: &'static str, compact_name: &'static str) -> Platform {
    Platform {
        long_name,
        compact_name,
        alias_of: None,
    }
}

const fn alias(
    long_name: &'static str,
    compact_name: &'static str,
    target: &'static str,
) -> Platform {
    Platform {
        long_name,
        compact_name,
        alias_of: Some(target),
    }
}

pub static UNKNOWN_PLATFORM: Platform = p("Unknown", PLATFORM_UNKNOWN_COMPACT);

/// Launcher platforms known to this crate
static PLATFORMS: &[Platform] = &[
    p("3DO Interactive Multiplayer", "3do"),
    p("Amstrad CPC", "cpc"),
    p("Atari 2600", "a2600"),
    p("Atari 5200", "a5200"),
    p("Atari 7800", "a7800"),
    p("Atari 8-bit", "atari-8bit"),
    p("Atari Jaguar", "jaguar"),
    p("Atari Jaguar CD", "jaguarcd"),
    p("Atari Lynx", "lynx"),
    p("Atari ST", "atari-st"),
    p("Bandai WonderSwan", "wswan"),
    p("Bandai WonderSwan Color", "wswancolor"),
    p("Casio Loopy", "loopy"),
    p("Casio PV-1000", "pv1000"),
    p("Coleco ColecoVision", "cvision"),
    p("Commodore 16", "c16"),
    p("Commodore 64", "c64"),
    p("Commodore Amiga", "amiga"),
    p("Commodore Amiga CD32", "cd32"),
    p("Commodore CDTV", "cdtv"),
    p("Commodore VIC-20", "vic20"),
    p("Emerson Arcadia 2001", "arcadia2001"),
    p("Entex Adventure Vision", "avision"),
    p("Fairchild Channel F", "channelf"),
    p("Fujitsu FM Towns Marty", "fmtmarty"),
    p("Funtech Super A'Can", "superacan"),
    p("GamePark GP32", "gp32"),
    p("GCE Vectrex", "vectrex"),
    p("Magnavox Odyssey2", "odyssey2"),
    p("MAME", PLATFORM_MAME_COMPACT),
    p("Mattel Intellivision", "ivision"),
    p("Microsoft MS-DOS", "msdos"),
    p("Microsoft MSX", "msx"),
    p("Microsoft MSX2", "msx2"),
    p("Microsoft Windows", "windows"),
    p("Microsoft Xbox", "xbox"),
    p("Microsoft Xbox 360", "xbox360"),
    p("Microsoft Xbox One", "xboxone"),
    p("NEC PC Engine", "pce"),
    p("NEC PC Engine CDROM2", "pcecd"),
    p("NEC PC-FX", "pcfx"),
    p("NEC SuperGrafx", "sgx"),
    alias("NEC TurboGrafx 16", "tg16", "pce"),
    alias("NEC TurboGrafx CD", "tg-cd", "pcecd"),
    p("Nintendo 3DS", "n3ds"),
    p("Nintendo 64", "n64"),
    p("Nintendo 64DD", "n64dd"),
    p("Nintendo DS", "nds"),
    p("Nintendo DSi", "ndsi"),
    p("Nintendo Famicom Disk System", "fds"),
    alias("Nintendo Famicom", "famicom", "nes"),
    p("Nintendo GameBoy", "gb"),
    p("Nintendo GameBoy Advance", "gba"),
    p("Nintendo GameBoy Color", "gbcolor"),
    p("Nintendo GameCube", "gamecube"),
    p("Nintendo NES", "nes"),
    p("Nintendo Pokemon Mini", "pokemini"),
    p("Nintendo SNES", "snes"),
    alias("Nintendo Super Famicom", "sfc", "snes"),
    p("Nintendo Switch", "switch"),
    p("Nintendo Virtual Boy", "vb"),
    p("Nintendo Wii", "wii"),
    p("Nintendo Wii U", "wiiu"),
    p("Ouya Ouya", "ouya"),
    p("Philips Videopac G7400", "g7400"),
    p("RCA Studio II", "studio2"),
    p("Sega 32X", "32x"),
    p("Sega Dreamcast", "dreamcast"),
    p("Sega Game Gear", "gamegear"),
    alias("Sega Genesis", "genesis", "megadrive"),
    p("Sega Master System", "sms"),
    p("Sega Mega Drive", "megadrive"),
    p("Sega MegaCD", "megacd"),
    alias("Sega SegaCD", "segacd", "megacd"),
    p("Sega PICO", "pico"),
    p("Sega Saturn", "saturn"),
    p("Sega SG-1000", "sg1000"),
    p("Sharp X68000", "x68k"),
    p("Sinclair ZX Spectrum", "spectrum"),
    p("Sinclair ZX80", "zx80"),
    p("Sinclair ZX81", "zx81"),
    p("SNK Neo-Geo CD", "neocd"),
    p("SNK Neo-Geo Pocket", "ngp"),
    p("SNK Neo-Geo Pocket Color", "ngpcolor"),
    p("Sony PlayStation", "psx"),
    p("Sony PlayStation 2", "ps2"),
    p("Sony PlayStation 3", "ps3"),
    p("Sony PlayStation 4", "ps4"),
    p("Sony PSP", "psp"),
    p("Sony PlayStation Vita", "psvita"),
    p("Tiger Game.com", "tigergame"),
    p("VTech CreatiVision", "creativision"),
    p("VTech V.Flash", "vflash"),
    p("VTech V.Smile", "vsmile"),
    p("Watara Supervision", "supervision"),
];

/// Compact platform name to MobyGames platform id
///
/// Order matters: when two compact names share a code, the reverse table
/// resolves the code to the first one listed.
static MOBYGAMES_CODES: &[(&str, u32)] = &[
    ("3do", 35),
    ("cpc", 60),
    ("a2600", 28),
    ("a5200", 33),
    ("a7800", 34),
    ("atari-8bit", 39),
    ("jaguar", 17),
    ("jaguarcd", 17),
    ("lynx", 18),
    ("atari-st", 24),
    ("wswan", 48),
    ("wswancolor", 49),
    ("loopy", 124),
    ("pv1000", 125),
    ("cvision", 29),
    ("c16", 115),
    ("c64", 27),
    ("amiga", 19),
    ("cd32", 56),
    ("cdtv", 83),
    ("vic20", 43),
    ("arcadia2001", 162),
    ("avision", 210),
    ("channelf", 76),
    ("fmtmarty", 102),
    ("superacan", 110),
    ("gp32", 108),
    ("vectrex", 37),
    ("odyssey2", 78),
    (PLATFORM_MAME_COMPACT, 143),
    ("ivision", 30),
    ("msdos", 2),
    ("msx", 57),
    ("msx2", 57),
    ("windows", 3),
    ("xbox", 13),
    ("xbox360", 69),
    ("xboxone", 142),
    ("pce", 40),
    ("pcecd", 45),
    ("pcfx", 59),
    ("sgx", 127),
    ("n3ds", 101),
    ("n64", 9),
    ("n64dd", 9),
    ("nds", 44),
    ("ndsi", 87),
    // NES before FDS so code 22 maps back to the NES
    ("nes", 22),
    ("fds", 22),
    ("gb", 10),
    ("gba", 12),
    ("gbcolor", 11),
    ("gamecube", 14),
    ("pokemini", 152),
    ("snes", 15),
    ("switch", 203),
    ("vb", 38),
    ("wii", 82),
    ("wiiu", 132),
    ("ouya", 144),
    ("g7400", 128),
    ("studio2", 113),
    ("32x", 21),
    ("dreamcast", 8),
    ("gamegear", 25),
    ("sms", 26),
    ("megadrive", 16),
    ("megacd", 20),
    ("pico", 103),
    ("saturn", 23),
    ("sg1000", 114),
    ("x68k", 106),
    ("spectrum", 41),
    ("zx80", 118),
    ("zx81", 119),
    ("neocd", 54),
    ("ngp", 52),
    ("ngpcolor", 53),
    ("psx", 6),
    ("ps2", 7),
    ("ps3", 81),
    ("ps4", 141),
    ("psp", 46),
    ("psvita", 105),
    ("tigergame", 50),
    ("creativision", 212),
    ("vflash", 189),
    ("vsmile", 42),
    ("supervision", 109),
];

/// Bidirectional platform lookup tables
pub struct PlatformMapper {
    by_compact: HashMap<&'static str, &'static Platform>,
    to_code: HashMap<&'static str, u32>,
    to_compact: HashMap<u32, &'static str>,
}

impl PlatformMapper {
    /// Builds the lookup tables, inverting the forward code table
    pub fn new() -> Self {
        let by_compact = PLATFORMS.iter().map(|p| (p.compact_name, p)).collect();
        let to_code = MOBYGAMES_CODES.iter().copied().collect();

        let mut to_compact = HashMap::new();
        for (compact, code) in MOBYGAMES_CODES {
            to_compact.entry(*code).or_insert(*compact);
        }

        Self {
            by_compact,
            to_code,
            to_compact,
        }
    }

    /// Process-wide mapper, built on first use
    pub fn global() -> &'static PlatformMapper {
        static MAPPER: OnceLock<PlatformMapper> = OnceLock::new();
        MAPPER.get_or_init(PlatformMapper::new)
    }

    /// Finds a launcher platform by long name or compact name
    ///
    /// Matching is case-insensitive. Unknown names resolve to
    /// [`UNKNOWN_PLATFORM`].
    pub fn platform(&self, name: &str) -> &'static Platform {
        let name = name.trim();
        PLATFORMS
            .iter()
            .find(|p| p.long_name.eq_ignore_ascii_case(name))
            .or_else(|| {
                let lower = name.to_ascii_lowercase();
                self.by_compact.get(lower.as_str()).copied()
            })
            .unwrap_or(&UNKNOWN_PLATFORM)
    }

    pub fn by_compact(&self, compact_name: &str) -> &'static Platform {
        self.by_compact
            .get(compact_name)
            .copied()
            .unwrap_or(&UNKNOWN_PLATFORM)
    }

    /// Launcher platform to MobyGames code
    ///
    /// Follows one alias indirection; returns [`UNKNOWN_PLATFORM_CODE`]
    /// when neither the platform nor its alias target is mapped.
    pub fn to_external(&self, platform: &str) -> u32 {
        let matching = self.platform(platform);
        if let Some(code) = self.to_code.get(matching.compact_name) {
            return *code;
        }
        if let Some(target) = matching.alias_of
            && let Some(code) = self.to_code.get(target)
        {
            return *code;
        }
        UNKNOWN_PLATFORM_CODE
    }

    /// MobyGames code to launcher platform, unknown codes give [`UNKNOWN_PLATFORM`]
    pub fn to_internal(&self, code: u32) -> &'static Platform {
        self.to_compact
            .get(&code)
            .map(|compact| self.by_compact(compact))
            .unwrap_or(&UNKNOWN_PLATFORM)
    }

    /// All launcher platforms in table order
    pub fn platforms(&self) -> &'static [Platform] {
        PLATFORMS
    }
}

impl Default for PlatformMapper {
    fn default() -> Self {
        Self::new()
    }
}
