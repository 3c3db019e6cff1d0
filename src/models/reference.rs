//! Code → display name tables for the Madrid air-quality network.

use crate::error::{ProcessingError, Result};
use crate::models::Measurement;

/// Pollutants ("magnitudes") measured by the network, keyed by 2-digit code.
pub const POLLUTANTS: [(&str, &str); 17] = [
    ("01", "Dióxido de Azufre"),
    ("06", "Monóxido de Carbono"),
    ("07", "Monóxido de Nitrógeno"),
    ("08", "Dióxido de Nitrógeno"),
    ("09", "Partículas < 2.5 μm"),
    ("10", "Partículas < 10 μm"),
    ("12", "Óxidos de Nitrógeno"),
    ("14", "Ozono"),
    ("20", "Tolueno"),
    ("30", "Benceno"),
    ("35", "Etilbenceno"),
    ("37", "Metaxileno"),
    ("38", "Paraxileno"),
    ("39", "Ortoxileno"),
    ("42", "Hidrocarburos totales(hexano)"),
    ("43", "Metano"),
    ("44", "Hidrocarburosno metánicos (hexano)"),
];

/// Monitoring stations keyed by 3-digit code. Display names are not unique.
pub const STATIONS: [(&str, &str); 38] = [
    ("001", "Pº. Recoletos"),
    ("002", "Glta. de Carlos V"),
    ("004", "Pza. de España"),
    ("006", "Pza. Dr. Marañón"),
    ("007", "Pza. M. de Salamanca"),
    ("008", "Escuelas Aguirre"),
    ("009", "Pza. Luca de Tena"),
    ("011", "Av. Ramón y Cajal"),
    ("012", "Pza. Manuel Becerra"),
    ("014", "Pza. Fdez. Ladreda"),
    ("015", "Pza. Castilla"),
    ("016", "Arturo Soria"),
    ("017", "Villaverde Alto"),
    ("018", "Calle Farolillo"),
    ("019", "Huerta Castañeda"),
    ("021", "Pza. Cristo Rey"),
    ("022", "Pº. Pontones"),
    ("023", "Final C/ Alcalá"),
    ("024", "Casa de Campo"),
    ("025", "Santa Eugenia"),
    ("026", "Urb. Embajada (Barajas)"),
    ("027", "Barajas"),
    ("035", "Pza. del Carmen"),
    ("036", "Moratalaz"),
    ("038", "Cuatro Caminos"),
    ("039", "Barrio del Pilar"),
    ("040", "Vallecas"),
    ("047", "Méndez Álvaro"),
    ("048", "Pº. Castellana"),
    ("049", "Retiro"),
    ("050", "Pza. Castilla"),
    ("054", "Ensanche Vallecas"),
    ("055", "Urb. Embajada (Barajas)"),
    ("056", "Plaza Elíptica"),
    ("057", "Sanchinarro"),
    ("058", "El Pardo"),
    ("059", "Parque Juan Carlos I"),
    ("060", "Tres Olivos"),
];

fn lookup(table: &'static [(&'static str, &'static str)], code: &str) -> Option<&'static str> {
    table
        .iter()
        .find(|(candidate, _)| *candidate == code)
        .map(|(_, name)| *name)
}

/// Display name of a pollutant code. Codes must already be zero-padded.
pub fn pollutant_name(code: &str) -> Result<&'static str> {
    lookup(&POLLUTANTS, code).ok_or_else(|| ProcessingError::UnknownPollutant {
        code: code.to_string(),
    })
}

/// Display name of a station code. Codes must already be zero-padded.
pub fn station_name(code: &str) -> Result<&'static str> {
    lookup(&STATIONS, code).ok_or_else(|| ProcessingError::UnknownStation {
        code: code.to_string(),
    })
}

pub fn is_known_pollutant(code: &str) -> bool {
    lookup(&POLLUTANTS, code).is_some()
}

pub fn is_known_station(code: &str) -> bool {
    lookup(&STATIONS, code).is_some()
}

/// Which code of a measurement a display name is derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeKind {
    Pollutant,
    Station,
}

impl CodeKind {
    pub fn code_of<'a>(&self, measurement: &'a Measurement) -> &'a str {
        match self {
            CodeKind::Pollutant => &measurement.pollutant,
            CodeKind::Station => &measurement.station,
        }
    }

    pub fn display_name(&self, code: &str) -> Result<&'static str> {
        match self {
            CodeKind::Pollutant => pollutant_name(code),
            CodeKind::Station => station_name(code),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CodeKind::Pollutant => "pollutant",
            CodeKind::Station => "station",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pollutant_lookup() {
        assert_eq!(pollutant_name("08").unwrap(), "Dióxido de Nitrógeno");
        assert_eq!(pollutant_name("12").unwrap(), "Óxidos de Nitrógeno");
        assert!(is_known_pollutant("14"));
    }

    #[test]
    fn test_unknown_pollutant_is_an_error() {
        let err = pollutant_name("99").unwrap_err();
        assert!(matches!(err, ProcessingError::UnknownPollutant { ref code } if code == "99"));

        // Codes are compared as fixed-width strings
        assert!(pollutant_name("8").is_err());
    }

    #[test]
    fn test_station_lookup() {
        assert_eq!(station_name("050").unwrap(), "Pza. Castilla");
        assert_eq!(station_name("017").unwrap(), "Villaverde Alto");
        assert!(matches!(
            station_name("50"),
            Err(ProcessingError::UnknownStation { .. })
        ));
    }

    #[test]
    fn test_tables_have_unique_codes() {
        let mut pollutant_codes: Vec<&str> = POLLUTANTS.iter().map(|(c, _)| *c).collect();
        pollutant_codes.sort_unstable();
        pollutant_codes.dedup();
        assert_eq!(pollutant_codes.len(), POLLUTANTS.len());

        let mut station_codes: Vec<&str> = STATIONS.iter().map(|(c, _)| *c).collect();
        station_codes.sort_unstable();
        station_codes.dedup();
        assert_eq!(station_codes.len(), STATIONS.len());

        assert!(POLLUTANTS.iter().all(|(c, _)| c.len() == 2));
        assert!(STATIONS.iter().all(|(c, _)| c.len() == 3));
    }
}
