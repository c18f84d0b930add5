//! Closed tag vocabulary for the train-arrival grammar.

/// One field of the train feed. The parser's only state is an
/// `Option<TrainTag>`: `Some` while inside a recognized or ignored field,
/// `None` between fields (reset on every end tag).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrainTag {
    Tmst,
    ErrCd,
    ErrNm,
    StaId,
    StpId,
    StaNm,
    StpDe,
    Rn,
    Rt,
    DestSt,
    DestNm,
    TrDr,
    Prdt,
    ArrT,
    IsApp,
    IsSch,
    IsDly,
    IsFlt,
    Lat,
    Lon,
    Heading,
    /// Recognized-as-unrecognized: container tags (`ctatt`, `eta`) and any
    /// vocabulary the feed grows later. Text inside is ignored, never an
    /// error.
    Other,
}

impl TrainTag {
    pub fn from_name(name: &[u8]) -> Self {
        match name {
            b"tmst" => TrainTag::Tmst,
            b"errCd" => TrainTag::ErrCd,
            b"errNm" => TrainTag::ErrNm,
            b"staId" => TrainTag::StaId,
            b"stpId" => TrainTag::StpId,
            b"staNm" => TrainTag::StaNm,
            b"stpDe" => TrainTag::StpDe,
            b"rn" => TrainTag::Rn,
            b"rt" => TrainTag::Rt,
            b"destSt" => TrainTag::DestSt,
            b"destNm" => TrainTag::DestNm,
            b"trDr" => TrainTag::TrDr,
            b"prdt" => TrainTag::Prdt,
            b"arrT" => TrainTag::ArrT,
            b"isApp" => TrainTag::IsApp,
            b"isSch" => TrainTag::IsSch,
            b"isDly" => TrainTag::IsDly,
            b"isFlt" => TrainTag::IsFlt,
            b"lat" => TrainTag::Lat,
            b"lon" => TrainTag::Lon,
            b"heading" => TrainTag::Heading,
            _ => TrainTag::Other,
        }
    }
}
