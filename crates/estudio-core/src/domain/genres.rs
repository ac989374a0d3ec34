/// Géneros que el selector del estudio ofrece por defecto.
///
/// El género de un lanzamiento sigue siendo texto libre; esta lista solo
/// alimenta el buscador del formulario.
pub const GENRES: &[&str] = &[
  "Hip Hop",
  "Pop",
  "Rock",
  "Eletrônica",
  "Trap",
  "R&B",
  "Funk",
  "Jazz",
  "Blues",
  "Reggae",
  "Lo-fi",
  "House",
  "Techno",
  "Dubstep",
  "MPB",
  "Sertanejo",
  "Gospel",
  "Metal",
  "Indie",
  "Alternativo",
];

/// Filtra [`GENRES`] por subcadena, sin distinguir mayúsculas y
/// conservando el orden. Una consulta vacía devuelve todo.
pub fn filter_genres(query: &str) -> Vec<&'static str> {
  let needle = query.trim().to_lowercase();
  GENRES.iter().copied().filter(|g| g.to_lowercase().contains(&needle)).collect()
}
