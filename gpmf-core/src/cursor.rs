//! Курсор обхода дерева записей GPMF.
//!
//! Курсор хранит явный стек уровней вложенности (не глубже
//! [`GPMF_NEST_LIMIT`]). На каждом уровне запоминается список уже
//! пройденных записей, поэтому поиск назад ([`RecordCursor::find_prev`])
//! идёт по истории обхода и не перечитывает байты буфера.

use gpmf_types::{FourCC, GpmfError, GpmfResult, SampleType};
use log::trace;

use crate::{metadata, record::RecordHeader, GPMF_HEADER_SIZE, GPMF_NEST_LIMIT};

/// Область поиска.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Только соседние записи текущего уровня
    CurrentLevel,
    /// Спускаться во вложенные записи и подниматься из исчерпанных уровней
    Recurse,
}

/// Как трактовать отсутствие записи.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    /// Отсутствие: ошибка [`GpmfError::TagNotFound`]
    Strict,
    /// Отсутствие: штатный результат
    Tolerant,
}

/// Результат поиска записи.
#[derive(Debug)]
#[must_use]
pub enum Search {
    /// Курсор стоит на найденной записи
    Found,
    /// Записи нет, курсор не сдвинулся
    NotFoundTolerated,
    /// Строгий промах или повреждённая структура, курсор не сдвинулся
    NotFoundFatal(GpmfError),
}

impl Search {
    pub fn is_found(&self) -> bool {
        matches!(self, Search::Found)
    }

    /// `Ok(true)`: найдено, `Ok(false)`: допустимый промах.
    pub fn into_result(self) -> GpmfResult<bool> {
        match self {
            Search::Found => Ok(true),
            Search::NotFoundTolerated => Ok(false),
            Search::NotFoundFatal(e) => Err(e),
        }
    }

    fn miss(
        key: FourCC,
        mode: SearchMode,
    ) -> Self {
        match mode {
            SearchMode::Tolerant => Search::NotFoundTolerated,
            SearchMode::Strict => Search::NotFoundFatal(GpmfError::TagNotFound(key)),
        }
    }
}

/// Один уровень вложенности.
#[derive(Debug, Clone)]
struct Level {
    /// Конец данных уровня (исключительно)
    end: usize,
    /// Смещение следующего непрочитанного заголовка
    next: usize,
    /// Пройденные записи в порядке обхода; последняя: текущая
    visited: Vec<RecordHeader>,
}

impl Level {
    fn new(
        start: usize,
        end: usize,
    ) -> Self {
        Level {
            end,
            next: start,
            visited: Vec::new(),
        }
    }
}

/// Курсор над одной полезной нагрузкой.
///
/// `Clone` создаёт независимую контрольную точку: копия знает ту же историю
/// обхода, но дальше двигается сама по себе.
#[derive(Debug, Clone)]
pub struct RecordCursor<'a> {
    buf: &'a [u8],
    /// Никогда не пуст: `levels[0]`: корневой уровень
    levels: Vec<Level>,
}

impl<'a> RecordCursor<'a> {
    /// Создаёт курсор на корневом уровне буфера.
    pub fn new(buf: &'a [u8]) -> GpmfResult<Self> {
        if buf.len() < GPMF_HEADER_SIZE {
            return Err(GpmfError::InvalidBuffer(buf.len()));
        }

        Ok(Self {
            buf,
            levels: vec![Level::new(0, buf.len())],
        })
    }

    /// Возвращает курсор в начало буфера, история обхода сбрасывается.
    pub fn reset(&mut self) {
        self.levels.clear();
        self.levels.push(Level::new(0, self.buf.len()));
    }

    /// Текущий уровень вложенности (0: корень).
    pub fn level(&self) -> usize {
        self.levels.len() - 1
    }

    /// Запись, на которой стоит курсор.
    pub fn record(&self) -> Option<&RecordHeader> {
        self.top().visited.last()
    }

    pub fn key(&self) -> FourCC {
        self.record().map_or(FourCC::NULL, |r| r.key)
    }

    pub fn type_code(&self) -> u8 {
        self.record().map_or(0, |r| r.type_code)
    }

    pub fn sample_type(&self) -> GpmfResult<SampleType> {
        SampleType::from_u8(self.type_code())
    }

    /// Количество выборок.
    pub fn repeat(&self) -> usize {
        self.record().map_or(0, |r| r.repeat as usize)
    }

    /// Байт на выборку.
    pub fn struct_size(&self) -> usize {
        self.record().map_or(0, |r| r.struct_size as usize)
    }

    /// Количество элементов в одной выборке.
    ///
    /// Для `?` считается по записи TYPE, найденной поиском назад; если её
    /// нет или она не разбирается, возвращается 0.
    pub fn elements_in_struct(&self) -> usize {
        match self.sample_type() {
            Ok(SampleType::Nest) | Err(_) => 0,
            Ok(SampleType::Complex) => metadata::resolve_element_types(self)
                .map(|types| types.len())
                .unwrap_or(0),
            Ok(ty) => self.struct_size() / ty.size_of(),
        }
    }

    /// Данные текущей записи без выравнивания (без копирования).
    pub fn raw_data(&self) -> &'a [u8] {
        match self.record() {
            Some(r) => &self.buf[r.data_offset()..r.data_end()],
            None => &[],
        }
    }

    /// Один шаг обхода: следующая запись в пределах `scope`.
    ///
    /// При `Recurse` вложенная текущая запись раскрывается, а исчерпанные
    /// уровни закрываются. `Ok(None)`: конец буфера (или уровня для
    /// `CurrentLevel`); позиция после этого не определена, поэтому
    /// `find_next` восстанавливает её из контрольной точки.
    pub fn next_record(
        &mut self,
        scope: Scope,
    ) -> GpmfResult<Option<RecordHeader>> {
        if scope == Scope::Recurse {
            if let Some(rec) = self.record().copied() {
                if rec.is_nest() && rec.data_len() > 0 {
                    if self.levels.len() >= GPMF_NEST_LIMIT {
                        return Err(GpmfError::NestTooDeep(GPMF_NEST_LIMIT));
                    }
                    self.levels.push(Level::new(rec.data_offset(), rec.data_end()));
                }
            }
        }

        loop {
            let buf = self.buf;
            let top = self.top_mut();

            if let Some(rec) = RecordHeader::parse(buf, top.next, top.end)? {
                top.next = rec.next_offset().min(top.end);
                top.visited.push(rec);
                return Ok(Some(rec));
            }

            top.next = top.end;

            if scope == Scope::CurrentLevel || self.levels.len() == 1 {
                return Ok(None);
            }

            self.levels.pop();
        }
    }

    /// Ищет вперёд запись с ключом `key`.
    ///
    /// При промахе курсор остаётся на месте.
    pub fn find_next(
        &mut self,
        key: FourCC,
        scope: Scope,
        mode: SearchMode,
    ) -> Search {
        let checkpoint = self.clone();

        loop {
            match self.next_record(scope) {
                Ok(Some(rec)) if rec.key == key => {
                    trace!("found {key} at {} (level {})", rec.offset, self.level());
                    return Search::Found;
                }
                Ok(Some(_)) => {}
                Ok(None) => {
                    *self = checkpoint;
                    return Search::miss(key, mode);
                }
                Err(e) => {
                    *self = checkpoint;
                    return Search::NotFoundFatal(e);
                }
            }
        }
    }

    /// Ищет назад ближайшую предшествующую запись с ключом `key` среди уже
    /// пройденных.
    ///
    /// `CurrentLevel` ищет только среди соседей текущей записи, `Recurse` затем
    /// записи, предшествующие охватывающим уровням. При промахе курсор
    /// остаётся на месте.
    pub fn find_prev(
        &mut self,
        key: FourCC,
        scope: Scope,
        mode: SearchMode,
    ) -> Search {
        let mut depth = self.levels.len();

        while depth > 0 {
            let visited = &self.levels[depth - 1].visited;
            // Последняя запись уровня: текущая или охватывающая
            let before = visited.len().saturating_sub(1);

            if let Some(idx) = visited[..before].iter().rposition(|r| r.key == key) {
                self.levels.truncate(depth);

                let top = self.top_mut();
                let rec = top.visited[idx];
                top.visited.truncate(idx + 1);
                top.next = rec.next_offset().min(top.end);

                return Search::Found;
            }

            if scope == Scope::CurrentLevel {
                break;
            }
            depth -= 1;
        }

        Search::miss(key, mode)
    }

    fn top(&self) -> &Level {
        &self.levels[self.levels.len() - 1]
    }

    fn top_mut(&mut self) -> &mut Level {
        let last = self.levels.len() - 1;
        &mut self.levels[last]
    }
}
